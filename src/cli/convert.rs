use super::ui;
use crate::core::config::HandoffConfig;
use crate::core::format::format_amount;
use crate::core::handoff::HandoffMessage;
use crate::core::{
    ConversionRequest, ConversionResult, ConversionService, ErrorBody, ExchangeError,
};
use anyhow::Result;
use comfy_table::Cell;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    pub json: bool,
    pub confirm: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConvertOutput<'a> {
    #[serde(flatten)]
    result: &'a ConversionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    handoff_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    handoff_link: Option<String>,
}

impl ConversionResult {
    pub fn display_as_table(&self) -> String {
        let (from, to) = self.direction.legs();
        let mut table = ui::new_styled_table();

        table.add_row(vec![
            ui::label_cell("From"),
            ui::value_cell(&format!("{from} {}", format_amount(self.amount))),
        ]);
        table.add_row(vec![
            ui::label_cell("To"),
            ui::highlight_cell(&format!("{to} {}", self.formatted_converted_amount)),
        ]);
        table.add_row(vec![
            ui::label_cell("USDT used"),
            ui::value_cell(&format!("{:.8}", self.bridge_units_used)),
        ]);
        table.add_row(vec![
            ui::label_cell("USDT→IDR market"),
            ui::value_cell(&format_amount(self.market_price_used)),
        ]);
        table.add_row(vec![
            ui::label_cell("USDT→TZS rate"),
            ui::value_cell(&format_amount(self.administrator_rate_used)),
        ]);
        table.add_row(vec![
            ui::label_cell("Profit applied"),
            ui::value_cell(&self.formatted_profit),
        ]);
        table.add_row(vec![
            ui::label_cell("Price as of"),
            Cell::new(self.price_timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ]);

        format!(
            "{}\n\n{}",
            ui::style_text("Do you want to exchange?", ui::StyleType::Title),
            table
        )
    }
}

/// Prints a failed request either as a structured body or a styled line.
pub fn report_error(err: &ExchangeError, json: bool) {
    if json {
        match serde_json::to_string_pretty(&ErrorBody::from(err)) {
            Ok(body) => println!("{body}"),
            Err(e) => tracing::error!(error = %e, "Failed to serialize error body"),
        }
    } else {
        eprintln!("{}", ui::style_text(&err.to_string(), ui::StyleType::Error));
    }
}

pub async fn run(
    service: &ConversionService,
    amount: &str,
    direction: &str,
    options: ConvertOptions,
    handoff: &HandoffConfig,
) -> Result<()> {
    let outcome = match ConversionRequest::parse(amount, direction) {
        Ok(request) => {
            let pb = (!options.json).then(|| ui::new_spinner("Fetching market price..."));
            let outcome = service.convert(&request).await;
            if let Some(pb) = pb {
                pb.finish_and_clear();
            }
            outcome
        }
        Err(e) => Err(e),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            report_error(&e, options.json);
            return Err(e.into());
        }
    };

    let message = options.confirm.then(|| {
        HandoffMessage::new(
            result.direction,
            result.amount,
            &result.formatted_converted_amount,
            &handoff.contact_name,
        )
    });
    let link = match (&message, &handoff.phone) {
        (Some(message), Some(phone)) => Some(message.link(phone)?.to_string()),
        _ => None,
    };

    if options.json {
        let output = ConvertOutput {
            result: &result,
            handoff_message: message.as_ref().map(|m| m.text().to_string()),
            handoff_link: link,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("{}", result.display_as_table());
    if let Some(message) = &message {
        ui::print_separator();
        println!("{}", message.text());
        match &link {
            Some(link) => println!(
                "\n{} {}",
                ui::style_text("Send it here:", ui::StyleType::TotalLabel),
                link
            ),
            None => println!(
                "\n{}",
                ui::style_text(
                    "No handoff phone configured; send the message manually.",
                    ui::StyleType::Subtle
                )
            ),
        }
    }

    Ok(())
}
