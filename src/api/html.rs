//! HTML rendering for browser clients

use crate::core::rates::RateRecord;
use std::fmt::Write;

const STYLE: &str = "body{font-family:sans-serif;margin:2rem}\
table{border-collapse:collapse}\
th,td{border:1px solid #ccc;padding:.3rem .8rem}\
td.num{text-align:right}\
.alert{color:#b00}";

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{}</h1>\n{body}\n<nav><a href=\"/exchange_rates\">All rates</a> | <a href=\"/exchange_rates/convert\">Convert</a></nav>\n</body>\n</html>\n",
        escape(title),
        escape(title),
    )
}

fn rate_row(out: &mut String, r: &RateRecord) {
    let _ = writeln!(
        out,
        "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td><a href=\"/exchange_rates/{}\">{}</a></td><td class=\"num\">{:.3}</td></tr>",
        escape(&r.country),
        escape(&r.currency),
        r.amount,
        escape(&r.code),
        escape(&r.code),
        r.rate,
    );
}

const TABLE_HEADER: &str =
    "<table>\n<tr><th>Country</th><th>Currency</th><th>Amount</th><th>Code</th><th>Rate (CZK)</th></tr>\n";

pub fn rates_page(rates: &[RateRecord]) -> String {
    let mut body = String::from(TABLE_HEADER);
    for r in rates {
        rate_row(&mut body, r);
    }
    body.push_str("</table>");
    layout("Exchange rates", &body)
}

pub fn rate_page(rate: &RateRecord) -> String {
    let mut body = String::from(TABLE_HEADER);
    rate_row(&mut body, rate);
    body.push_str("</table>");
    layout(&format!("Exchange rate for {}", rate.code), &body)
}

/// State of the convert form.
#[derive(Debug, Default)]
pub struct ConvertView<'a> {
    pub currencies: &'a [String],
    pub selected: Option<&'a str>,
    pub amount: Option<f64>,
    pub converted: Option<f64>,
    pub alert: Option<&'a str>,
}

pub fn convert_page(view: &ConvertView<'_>) -> String {
    let mut body = String::new();

    if let Some(alert) = view.alert {
        let _ = writeln!(body, "<p class=\"alert\">{}</p>", escape(alert));
    }

    body.push_str("<form action=\"/exchange_rates/convert\" method=\"get\">\n");
    let _ = writeln!(
        body,
        "<label>Amount <input type=\"number\" step=\"any\" min=\"0\" name=\"amount\" value=\"{}\"></label>",
        view.amount.map(|a| a.to_string()).unwrap_or_default()
    );
    body.push_str("<label>Currency <select name=\"currency\">\n");
    for code in view.currencies {
        let selected = if view.selected == Some(code.as_str()) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            body,
            "<option value=\"{}\"{selected}>{}</option>",
            escape(code),
            escape(code)
        );
    }
    body.push_str("</select></label>\n<button type=\"submit\">Convert</button>\n</form>");

    if let (Some(converted), Some(code), Some(amount)) = (view.converted, view.selected, view.amount)
    {
        let _ = write!(
            body,
            "\n<p>{} {} = <strong>{:.2} CZK</strong></p>",
            amount,
            escape(code),
            converted
        );
    }

    layout("Currency converter", &body)
}
