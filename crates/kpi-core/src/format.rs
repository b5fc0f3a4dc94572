//! Display formatting for card values and delta chips.

use num_format::{Locale, ToFormattedString};

/// Fixed decimals with `en` thousands separators: `1,234,567.89`.
///
/// A value that rounds to zero is printed without a minus sign.
pub fn format_number(value: f64, decimals: usize) -> String {
  let fixed = format!("{:.*}", decimals, value.abs());
  let (int_part, frac_part) = match fixed.split_once('.') {
    Some((i, f)) => (i, Some(f)),
    None => (fixed.as_str(), None),
  };
  let grouped = match int_part.parse::<u64>() {
    Ok(n) => n.to_formatted_string(&Locale::en),
    Err(_) => int_part.to_owned(),
  };
  let mut out = grouped;
  if let Some(frac) = frac_part {
    out.push('.');
    out.push_str(frac);
  }
  let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
  if value.is_sign_negative() && !is_zero {
    format!("-{out}")
  } else {
    out
  }
}

/// Whole US dollars: `$1,235`, `-$40`.
pub fn format_currency(value: f64) -> String { with_dollar(format_number(value, 0)) }

/// Dollars and cents: `$123.45`.
pub fn format_currency_cents(value: f64) -> String { with_dollar(format_number(value, 2)) }

fn with_dollar(number: String) -> String {
  match number.strip_prefix('-') {
    Some(rest) => format!("-${rest}"),
    None => format!("${number}"),
  }
}

/// Signed percent with one decimal: `+4.2%`, `-0.5%`, `+0.0%`.
pub fn format_percent(value: f64) -> String {
  let body = format_number(value, 1);
  if body.starts_with('-') {
    format!("{body}%")
  } else {
    format!("+{body}%")
  }
}

/// Unsigned-style percent with one decimal: `12.5%`.
pub fn format_absolute_percent(value: f64) -> String {
  format!("{}%", format_number(value, 1))
}
