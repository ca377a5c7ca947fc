use custody_core::CustodyStore;

use crate::app::AppContext;
use crate::ui::{badge, hint, print, Badge, OutputMode};

pub fn handle_check(ctx: &AppContext) -> anyhow::Result<()> {
    let store = ctx.open_store()?;
    let ui = ctx.ui();

    match store.check_integrity() {
        Ok(()) => {
            if ctx.quiet() {
                return Ok(());
            }
            match ui.mode {
                OutputMode::Pretty => {
                    print(ui, &badge(ui, Badge::Ok, "All checks passed"));
                }
                OutputMode::Plain => {
                    println!("check=sqlite ok");
                    println!("check=foreign_keys ok");
                    println!("check=signatures ok");
                    println!("check=metadata_keys ok");
                    println!("status=ok");
                }
                OutputMode::Json => {
                    crate::output::print_json(&serde_json::json!({ "status": "ok" }))?;
                }
            }
        }
        Err(err) => {
            match ui.mode {
                OutputMode::Pretty => {
                    print(ui, &badge(ui, Badge::Err, "Integrity check failed"));
                    eprintln!("Error: {}", err);
                    print(ui, &hint(ui, "Restore the database from a backup."));
                }
                OutputMode::Plain => {
                    eprintln!("status=failed");
                    eprintln!("error={}", err);
                }
                OutputMode::Json => {
                    crate::output::print_json(&serde_json::json!({
                        "status": "failed",
                        "error": err.to_string(),
                    }))?;
                }
            }
            return Err(anyhow::anyhow!("Integrity check failed"));
        }
    }
    Ok(())
}
