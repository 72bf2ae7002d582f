use super::ui;
use crate::core::error::ConversionError;
use crate::core::rates::RateRecord;
use crate::service::RateService;
use anyhow::{Result, bail};
use comfy_table::Cell;

/// Renders rates as a table, one row per record.
pub fn rates_table(rates: &[RateRecord]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Country"),
        ui::header_cell("Currency"),
        ui::header_cell("Amount"),
        ui::header_cell("Code"),
        ui::header_cell("Rate (CZK)"),
    ]);

    for rate in rates {
        table.add_row(vec![
            Cell::new(&rate.country),
            Cell::new(&rate.currency),
            ui::number_cell(format!("{}", rate.amount)),
            Cell::new(&rate.code),
            ui::number_cell(format!("{:.3}", rate.rate)),
        ]);
    }

    table.to_string()
}

pub async fn list(service: &RateService) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let snapshot = service.get_rates().await;
    pb.finish_and_clear();
    let snapshot = snapshot?;

    if snapshot.is_empty() {
        bail!("No exchange rates are available");
    }

    println!(
        "{}\n",
        ui::style_text("Exchange rates", ui::StyleType::Title)
    );
    println!("{}", rates_table(&snapshot.records));
    println!(
        "\n{}",
        ui::style_text(
            &format!("Fetched at {}", snapshot.fetched_at.format("%Y-%m-%d %H:%M:%S UTC")),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

pub async fn show(service: &RateService, code: &str) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let rate = service.find_by_code(code).await;
    pb.finish_and_clear();

    match rate? {
        Some(rate) => {
            println!("{}", rates_table(std::slice::from_ref(&rate)));
            Ok(())
        }
        None => bail!("Currency not found: {}", code.to_uppercase()),
    }
}

pub async fn convert(service: &RateService, code: &str, amount: f64) -> Result<()> {
    let pb = ui::new_spinner("Fetching exchange rates...");
    let result = service.convert(code, amount).await;
    pb.finish_and_clear();

    match result {
        Ok(converted) => {
            println!(
                "{} {} = {}",
                amount,
                ui::style_text(&code.to_uppercase(), ui::StyleType::TotalLabel),
                ui::style_text(&format!("{converted:.2} CZK"), ui::StyleType::TotalValue)
            );
            Ok(())
        }
        Err(ConversionError::InvalidAmount(_)) => {
            eprintln!(
                "{}",
                ui::style_text("Please enter a valid amount.", ui::StyleType::Error)
            );
            bail!("Invalid amount: {amount}")
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rates_table_contains_rows() {
        let rates = vec![RateRecord {
            country: "Hungary".to_string(),
            currency: "forint".to_string(),
            amount: 100.0,
            code: "HUF".to_string(),
            rate: 6.307,
        }];

        let table = rates_table(&rates);
        assert!(table.contains("Hungary"));
        assert!(table.contains("forint"));
        assert!(table.contains("100"));
        assert!(table.contains("HUF"));
        assert!(table.contains("6.307"));
    }
}
