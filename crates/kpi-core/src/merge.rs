//! Full outer join of two numeric series on a shared key column.

use std::collections::{BTreeMap, BTreeSet};

use crate::normalize::Row;

/// Merge `primary` and `secondary` on `key`.
///
/// - Every key present in either series appears exactly once; output is
///   ascending by key.
/// - Every output row carries the same field set: the union of both series'
///   fields. A side with no row for a key contributes nulls.
/// - A non-key field present in both series keeps its name for the primary
///   side; the secondary side's copy is renamed to
///   `{secondary_prefix}{field}`. If that name is itself taken by either
///   series, a counter is appended (`{secondary_prefix}{field}2`, ...) so no
///   value is ever overwritten.
/// - Rows with a null or missing key are dropped. Within one series the first
///   row for a key wins.
pub fn merge_by_key(
  primary:          &[Row],
  secondary:        &[Row],
  key:              &str,
  secondary_prefix: &str,
) -> Vec<Row> {
  let primary_fields = field_names(primary, key);
  let secondary_fields = field_names(secondary, key);

  let mut taken: BTreeSet<String> = primary_fields
    .union(&secondary_fields)
    .cloned()
    .chain([key.to_owned()])
    .collect();
  let renamed: BTreeMap<&str, String> = secondary_fields
    .iter()
    .map(|field| {
      let name = if primary_fields.contains(field) {
        free_name(&mut taken, secondary_prefix, field)
      } else {
        field.clone()
      };
      (field.as_str(), name)
    })
    .collect();

  let mut keys: Vec<f64> = primary
    .iter()
    .chain(secondary)
    .filter_map(|row| key_of(row, key))
    .collect();
  keys.sort_by(f64::total_cmp);
  keys.dedup();

  keys
    .into_iter()
    .map(|k| {
      let mut out = Row::new();
      out.insert(key.to_owned(), Some(k));

      let own = find(primary, key, k);
      for field in &primary_fields {
        out.insert(field.clone(), own.and_then(|r| r.get(field).copied().flatten()));
      }

      let other = find(secondary, key, k);
      for field in &secondary_fields {
        out.insert(
          renamed[field.as_str()].clone(),
          other.and_then(|r| r.get(field).copied().flatten()),
        );
      }
      out
    })
    .collect()
}

/// Copy of `rows` with every field except `key` renamed to `{prefix}{field}`.
pub fn prefix_fields(rows: &[Row], key: &str, prefix: &str) -> Vec<Row> {
  rows
    .iter()
    .map(|row| {
      row
        .iter()
        .map(|(field, value)| {
          let name = if field == key { field.clone() } else { format!("{prefix}{field}") };
          (name, *value)
        })
        .collect()
    })
    .collect()
}

fn free_name(taken: &mut BTreeSet<String>, prefix: &str, field: &str) -> String {
  let mut name = format!("{prefix}{field}");
  let mut suffix = 2u32;
  while taken.contains(&name) {
    name = format!("{prefix}{field}{suffix}");
    suffix += 1;
  }
  taken.insert(name.clone());
  name
}

fn key_of(row: &Row, key: &str) -> Option<f64> {
  row.get(key).copied().flatten().filter(|k| k.is_finite())
}

fn find<'a>(series: &'a [Row], key: &str, value: f64) -> Option<&'a Row> {
  series.iter().find(|row| key_of(row, key) == Some(value))
}

fn field_names(series: &[Row], key: &str) -> BTreeSet<String> {
  series
    .iter()
    .flat_map(|row| row.keys())
    .filter(|field| field.as_str() != key)
    .cloned()
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn row(pairs: &[(&str, Option<f64>)]) -> Row {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
  }

  #[test]
  fn output_keys_are_the_sorted_union() {
    let store = vec![
      row(&[("MonthNumber", Some(3.0)), ("TotalSales", Some(30.0))]),
      row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(10.0))]),
    ];
    let chain = vec![
      row(&[("MonthNumber", Some(2.0)), ("StoreCount", Some(4.0))]),
      row(&[("MonthNumber", Some(1.0)), ("StoreCount", Some(5.0))]),
    ];
    let merged = merge_by_key(&store, &chain, "MonthNumber", "Chain");
    let keys: Vec<f64> = merged.iter().map(|r| r["MonthNumber"].unwrap()).collect();
    assert_eq!(keys, [1.0, 2.0, 3.0]);
  }

  #[test]
  fn missing_side_yields_null_placeholders() {
    let store = vec![row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(10.0))])];
    let chain = vec![row(&[("MonthNumber", Some(2.0)), ("StoreCount", Some(4.0))])];
    let merged = merge_by_key(&store, &chain, "MonthNumber", "Chain");

    assert_eq!(merged.len(), 2);
    for r in &merged {
      assert_eq!(r.len(), 3, "{r:?}");
    }
    assert_eq!(merged[0]["StoreCount"], None);
    assert_eq!(merged[1]["TotalSales"], None);
    assert_eq!(merged[1]["StoreCount"], Some(4.0));
  }

  #[test]
  fn colliding_fields_are_not_overwritten() {
    let store = vec![row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(10.0))])];
    let chain = vec![row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(90.0))])];
    let merged = merge_by_key(&store, &chain, "MonthNumber", "Chain");
    assert_eq!(merged[0]["TotalSales"], Some(10.0));
    assert_eq!(merged[0]["ChainTotalSales"], Some(90.0));
  }

  #[test]
  fn prefixed_name_already_in_primary_gets_a_counter() {
    let store = vec![row(&[
      ("MonthNumber", Some(1.0)),
      ("TotalSales", Some(10.0)),
      ("ChainTotalSales", Some(55.0)),
    ])];
    let chain = vec![row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(90.0))])];
    let merged = merge_by_key(&store, &chain, "MonthNumber", "Chain");

    assert_eq!(merged[0].len(), 4, "{:?}", merged[0]);
    assert_eq!(merged[0]["TotalSales"], Some(10.0));
    assert_eq!(merged[0]["ChainTotalSales"], Some(55.0));
    assert_eq!(merged[0]["ChainTotalSales2"], Some(90.0));
  }

  #[test]
  fn prefixed_name_already_in_secondary_gets_a_counter() {
    let store = vec![row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(10.0))])];
    let chain = vec![row(&[
      ("MonthNumber", Some(1.0)),
      ("TotalSales", Some(90.0)),
      ("ChainTotalSales", Some(7.0)),
    ])];
    let merged = merge_by_key(&store, &chain, "MonthNumber", "Chain");

    assert_eq!(merged[0].len(), 4, "{:?}", merged[0]);
    assert_eq!(merged[0]["TotalSales"], Some(10.0));
    assert_eq!(merged[0]["ChainTotalSales"], Some(7.0));
    assert_eq!(merged[0]["ChainTotalSales2"], Some(90.0));
  }

  #[test]
  fn prefix_fields_leaves_the_key_alone() {
    let chain = vec![row(&[("MonthNumber", Some(2.0)), ("StoreCount", Some(4.0))])];
    let prefixed = prefix_fields(&chain, "MonthNumber", "Chain");
    assert_eq!(
      prefixed,
      vec![row(&[("MonthNumber", Some(2.0)), ("ChainStoreCount", Some(4.0))])]
    );
  }

  #[test]
  fn rows_without_key_are_dropped_and_duplicates_collapse() {
    let store = vec![
      row(&[("TotalSales", Some(1.0))]),
      row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(10.0))]),
      row(&[("MonthNumber", Some(1.0)), ("TotalSales", Some(99.0))]),
    ];
    let merged = merge_by_key(&store, &[], "MonthNumber", "Chain");
    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0]["TotalSales"], Some(10.0));
  }

  #[test]
  fn empty_inputs_merge_to_empty() {
    assert!(merge_by_key(&[], &[], "MonthNumber", "Chain").is_empty());
  }
}
