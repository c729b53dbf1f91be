use super::convert::report_error;
use super::ui;
use crate::core::ConversionService;
use crate::core::format::format_amount;
use anyhow::Result;

/// Forces a fresh market price fetch and prints it.
pub async fn run(service: &ConversionService, json: bool) -> Result<()> {
    let pb = (!json).then(|| ui::new_spinner("Fetching market price..."));
    let outcome = service.refresh_market().await;
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    let snapshot = match outcome {
        Ok(snapshot) => snapshot,
        Err(e) => {
            report_error(&e, json);
            return Err(e.into());
        }
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "marketRate": snapshot.price,
                "updatedAt": snapshot.fetched_at,
            }))?
        );
        return Ok(());
    }

    let pair = service.market().pair();
    let mut table = ui::new_styled_table();
    table.add_row(vec![
        ui::label_cell(&format!("{pair} market rate")),
        ui::highlight_cell(&format_amount(snapshot.price)),
    ]);
    table.add_row(vec![
        ui::label_cell("Updated"),
        ui::value_cell(
            &snapshot
                .fetched_at
                .format("%Y-%m-%d %H:%M:%S UTC")
                .to_string(),
        ),
    ]);
    println!("{table}");
    Ok(())
}
