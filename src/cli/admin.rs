use super::convert::report_error;
use super::ui;
use crate::core::format::format_amount;
use crate::core::{ConversionService, SettingsView};
use anyhow::Result;

impl SettingsView {
    pub fn display_as_table(&self) -> String {
        let mut table = ui::new_styled_table();
        table.add_row(vec![
            ui::label_cell("USDT→TZS rate"),
            ui::format_optional_cell(self.bridge_to_local_rate, format_amount),
        ]);
        table.add_row(vec![
            ui::label_cell("Admin password"),
            ui::value_cell(&self.admin_secret),
        ]);
        table.add_row(vec![
            ui::label_cell("Market price updated"),
            ui::format_optional_cell(self.price_updated_at, |t| {
                t.format("%Y-%m-%d %H:%M:%S UTC").to_string()
            }),
        ]);
        table.to_string()
    }
}

fn print_view(view: &SettingsView, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
    } else {
        println!("{}", view.display_as_table());
    }
    Ok(())
}

pub async fn show(service: &ConversionService, json: bool) -> Result<()> {
    match service.settings_view().await {
        Ok(view) => print_view(&view, json),
        Err(e) => {
            report_error(&e, json);
            Err(e.into())
        }
    }
}

pub async fn set_rate(
    service: &ConversionService,
    secret: &str,
    rate: &str,
    json: bool,
) -> Result<()> {
    match service.update_rate_str(secret, rate).await {
        Ok(view) => {
            if !json {
                println!(
                    "{}\n",
                    ui::style_text(
                        "Saved. Market price will be refetched.",
                        ui::StyleType::TotalValue
                    )
                );
            }
            print_view(&view, json)
        }
        Err(e) => {
            report_error(&e, json);
            Err(e.into())
        }
    }
}
