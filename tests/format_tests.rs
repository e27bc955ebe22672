use autoplot_charts::core::datetime_to_unix_seconds;
use autoplot_charts::format::{DateFormat, NumberFormat, date_format, number_format};
use chrono::{TimeZone, Utc};

fn friday_afternoon() -> f64 {
    let time = Utc
        .with_ymd_and_hms(2021, 1, 1, 15, 4, 5)
        .single()
        .expect("valid date");
    datetime_to_unix_seconds(time)
}

#[test]
fn date_precision_thresholds() {
    assert_eq!(date_format(365.0), DateFormat::Date);
    assert_eq!(date_format(30.0), DateFormat::Date);
    assert_eq!(date_format(29.999), DateFormat::DateHour);
    assert_eq!(date_format(5.0), DateFormat::DateHour);
    assert_eq!(date_format(4.999), DateFormat::DateHourMinute);
    assert_eq!(date_format(0.25), DateFormat::DateHourMinute);
    assert_eq!(date_format(0.2499), DateFormat::DayHourMinuteSecond);
    assert_eq!(date_format(0.0), DateFormat::DayHourMinuteSecond);
}

#[test]
fn dates_render_in_utc() {
    let time = friday_afternoon();
    assert_eq!(DateFormat::Date.format(time), "2021-01-01");
    assert_eq!(DateFormat::DateHour.format(time), "2021-01-01 15:00");
    assert_eq!(DateFormat::DateHourMinute.format(time), "2021-01-01 15:04");
    assert_eq!(DateFormat::DayHourMinuteSecond.format(time), "Fri 01, 15:04:05");
    assert_eq!(DateFormat::Date.format(f64::NAN), "nan");
}

#[test]
fn number_format_follows_magnitude() {
    assert_eq!(number_format(0.0005), NumberFormat::SiPrefix { significant: 5 });
    assert_eq!(number_format(-0.5), NumberFormat::Fixed { decimals: 5 });
    assert_eq!(number_format(0.001), NumberFormat::Fixed { decimals: 5 });
    assert_eq!(number_format(1.0), NumberFormat::Significant { digits: 5 });
    assert_eq!(number_format(9_999.0), NumberFormat::Significant { digits: 5 });
    assert_eq!(number_format(10_000.0), NumberFormat::GroupedInteger);
    assert_eq!(number_format(999_999.0), NumberFormat::GroupedInteger);
    assert_eq!(number_format(1_000_000.0), NumberFormat::SiPrefix { significant: 5 });
}

#[test]
fn tooltip_values_render_as_expected() {
    let render = |value: f64| number_format(value).format(value);
    assert_eq!(render(0.5), "0.50000");
    assert_eq!(render(12.5), "12.500");
    assert_eq!(render(1_234_567.0), "1.2346M");
    assert_eq!(render(-10_001.0), "-10,001");
    assert_eq!(render(f64::INFINITY), "nan");
}
