use crate::bulk::{self, RawDataset};
use crate::domain::{Frequency, Period, TimeFormat};
use crate::error::FetchError;
use crate::table::{ColumnData, DimensionColumn, TidyTable, TimeValue};

/// Reshapes a raw wide dataset into long form: one row per
/// (composite-key row, kept period column).
pub fn tidy(
    raw: &RawDataset,
    time_format: TimeFormat,
    select_time: Option<Frequency>,
    typed_columns: bool,
) -> Result<TidyTable, FetchError> {
    let kept = select_periods(raw, time_format, select_time)?;

    let width = raw
        .rows
        .iter()
        .map(|row| row.key.len())
        .max()
        .unwrap_or(0)
        .max(raw.dimension_names.len());

    let mut dimension_values: Vec<Vec<String>> = vec![Vec::new(); width];
    let mut time = Vec::new();
    let mut values = Vec::new();

    for row in &raw.rows {
        for (column, period) in &kept {
            for (index, slot) in dimension_values.iter_mut().enumerate() {
                slot.push(row.key.get(index).cloned().unwrap_or_default());
            }
            time.push(time_value(&raw.periods[*column], *period, time_format));
            values.push(bulk::parse_value(&row.cells[*column]));
        }
    }

    let dimensions = dimension_values
        .into_iter()
        .enumerate()
        .map(|(index, data)| DimensionColumn {
            name: raw
                .dimension_names
                .get(index)
                .cloned()
                .unwrap_or_else(|| format!("dim{}", index + 1)),
            data: if typed_columns {
                ColumnData::categorical_from(data)
            } else {
                ColumnData::Plain(data)
            },
        })
        .collect();

    Ok(TidyTable {
        dimensions,
        time,
        values,
    })
}

/// Resolves which period columns survive and, for the typed time formats,
/// their parsed periods. The typed formats require one consistent frequency
/// across the kept columns; raw passes labels through untouched.
fn select_periods(
    raw: &RawDataset,
    time_format: TimeFormat,
    select_time: Option<Frequency>,
) -> Result<Vec<(usize, Option<Period>)>, FetchError> {
    let mut kept = Vec::with_capacity(raw.periods.len());

    for (column, label) in raw.periods.iter().enumerate() {
        let period = label.parse::<Period>();
        match select_time {
            Some(frequency) => {
                // Labels that cannot match the requested frequency are dropped.
                if let Ok(period) = period {
                    if period.frequency() == frequency {
                        kept.push((column, Some(period)));
                    }
                }
            }
            None => match (time_format, period) {
                (TimeFormat::Raw, result) => kept.push((column, result.ok())),
                (_, Ok(period)) => kept.push((column, Some(period))),
                (_, Err(err)) => return Err(err),
            },
        }
    }

    if time_format != TimeFormat::Raw {
        let mut markers: Vec<char> = kept
            .iter()
            .filter_map(|(_, period)| period.map(|p| p.frequency().marker()))
            .collect();
        markers.sort_unstable();
        markers.dedup();
        if markers.len() > 1 {
            let list = markers
                .iter()
                .map(|marker| marker.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            return Err(FetchError::MixedFrequencies(list));
        }
    }

    Ok(kept)
}

fn time_value(label: &str, period: Option<Period>, time_format: TimeFormat) -> TimeValue {
    match (time_format, period) {
        (TimeFormat::Date, Some(period)) => TimeValue::Date(period.start_date()),
        (TimeFormat::DateLast, Some(period)) => TimeValue::Date(period.end_date()),
        (TimeFormat::Num, Some(period)) => TimeValue::Num(period.to_num()),
        _ => TimeValue::Raw(label.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;
    use crate::bulk::parse_tsv;

    fn bus_raw() -> RawDataset {
        parse_tsv("unit,vehicle,geo\\time\t1990\t1991\t1992\nPC,BUS_TOT,AT\tNA\tNA\t9.9\n")
            .unwrap()
    }

    #[test]
    fn melts_wide_matrix_into_long_rows() {
        let table = tidy(&bus_raw(), TimeFormat::Raw, None, false).unwrap();
        assert_eq!(table.column_names(), vec!["unit", "vehicle", "geo", "time", "values"]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.dimension("unit").unwrap().data.get(0), Some("PC"));
        assert_eq!(table.dimension("vehicle").unwrap().data.get(1), Some("BUS_TOT"));
        assert_eq!(table.dimension("geo").unwrap().data.get(2), Some("AT"));
        assert_eq!(
            table.time,
            vec![
                TimeValue::Raw("1990".to_string()),
                TimeValue::Raw("1991".to_string()),
                TimeValue::Raw("1992".to_string()),
            ]
        );
        assert_eq!(table.values, vec![None, None, Some(9.9)]);
    }

    #[test]
    fn date_format_maps_to_period_start() {
        let table = tidy(&bus_raw(), TimeFormat::Date, None, true).unwrap();
        assert_eq!(
            table.time[0],
            TimeValue::Date(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap())
        );
    }

    #[test]
    fn date_last_format_maps_to_period_end() {
        let table = tidy(&bus_raw(), TimeFormat::DateLast, None, true).unwrap();
        assert_eq!(
            table.time[2],
            TimeValue::Date(NaiveDate::from_ymd_opt(1992, 12, 31).unwrap())
        );
    }

    #[test]
    fn num_format_maps_to_decimal_year() {
        let raw = parse_tsv("unit,geo\\time\t2015Q1\t2015Q3\nPC,AT\t1.0\t2.0\n").unwrap();
        let table = tidy(&raw, TimeFormat::Num, None, true).unwrap();
        assert_eq!(table.time, vec![TimeValue::Num(2015.0), TimeValue::Num(2015.5)]);
    }

    #[test]
    fn select_time_filters_non_matching_periods() {
        let raw = parse_tsv("unit,geo\\time\t2014\t2015Q1\t2015Q2\nPC,AT\t1.0\t2.0\t3.0\n")
            .unwrap();
        let table = tidy(&raw, TimeFormat::Date, Some(Frequency::Quarter), true).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.time[0],
            TimeValue::Date(NaiveDate::from_ymd_opt(2015, 1, 1).unwrap())
        );
        assert_eq!(table.values, vec![Some(2.0), Some(3.0)]);
    }

    #[test]
    fn mixed_frequencies_fail_for_typed_formats() {
        let raw = parse_tsv("unit,geo\\time\t2014\t2015Q1\nPC,AT\t1.0\t2.0\n").unwrap();
        let err = tidy(&raw, TimeFormat::Date, None, true).unwrap_err();
        assert_matches!(err, FetchError::MixedFrequencies(list) if list == "Q, Y");
    }

    #[test]
    fn mixed_frequencies_tolerated_in_raw_format() {
        let raw = parse_tsv("unit,geo\\time\t2014\t2015Q1\nPC,AT\t1.0\t2.0\n").unwrap();
        let table = tidy(&raw, TimeFormat::Raw, None, false).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn unparsable_label_fails_for_typed_formats() {
        let raw = parse_tsv("unit,geo\\time\ttotal\nPC,AT\t1.0\n").unwrap();
        let err = tidy(&raw, TimeFormat::Date, None, true).unwrap_err();
        assert_matches!(err, FetchError::InvalidPeriod(_));
    }

    #[test]
    fn empty_dataset_keeps_headers() {
        let raw = parse_tsv("unit,geo\\time\t2020\t2021\n").unwrap();
        let table = tidy(&raw, TimeFormat::Date, None, true).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.column_names(), vec!["unit", "geo", "time", "values"]);
    }

    #[test]
    fn short_header_falls_back_to_positional_names() {
        let raw = parse_tsv("unit\\time\t2020\nPC,AT\t1.0\n").unwrap();
        let table = tidy(&raw, TimeFormat::Raw, None, false).unwrap();
        assert_eq!(table.column_names(), vec!["unit", "dim2", "time", "values"]);
        assert_eq!(table.dimension("dim2").unwrap().data.get(0), Some("AT"));
    }

    #[test]
    fn typed_columns_encode_categoricals() {
        let raw = parse_tsv("geo\\time\t2020\nAT\t1.0\nBE\t2.0\nAT\t3.0\n").unwrap();
        let table = tidy(&raw, TimeFormat::Raw, None, true).unwrap();
        let ColumnData::Categorical { levels, codes } = &table.dimension("geo").unwrap().data
        else {
            panic!("expected categorical column");
        };
        assert_eq!(levels, &["AT", "BE"]);
        assert_eq!(codes, &[0, 1, 0]);
    }
}
