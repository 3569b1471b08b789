use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use fc3d_db::rusqlite::Connection;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use fc3d_db::db::insert_draw;
use fc3d_db::models::{RawDraw, parse_digits};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];

/// Normalizes a draw date to `YYYY-MM-DD`.
pub fn parse_date(raw: &str) -> Result<String> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(date.format("%Y-%m-%d").to_string());
        }
    }
    bail!("日期格式无效: '{}'", raw)
}

/// `period,date,d1,d2,d3` or `period,date,d1d2d3`.
fn parse_record(record: &csv::StringRecord) -> Result<RawDraw> {
    let get = |idx: usize| {
        record
            .get(idx)
            .map(str::trim)
            .with_context(|| format!("第{}列缺失", idx + 1))
    };

    let period = get(0)?;
    let date = parse_date(get(1)?)?;

    let digits = match record.len() {
        3 => parse_digits(get(2)?)?,
        n if n >= 5 => {
            let parts = [get(2)?, get(3)?, get(4)?];
            let mut digits = [0i64; 3];
            for (slot, s) in digits.iter_mut().zip(parts) {
                *slot = s
                    .parse::<i64>()
                    .with_context(|| format!("无法解析号码 '{}'", s))?;
            }
            return RawDraw::from_parts(period, &date, &digits);
        }
        n => bail!("字段数量不正确: {}", n),
    };

    let draw = RawDraw::new(period, date, digits);
    draw.validate()?;
    Ok(draw)
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportResult {
    pub total_records: u32,
    pub inserted: u32,
    pub skipped: u32,
    pub errors: u32,
}

pub fn import_csv(conn: &Connection, path: &Path) -> Result<ImportResult> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("无法打开 {:?}", path))?;

    let tx = conn.unchecked_transaction()
        .context("无法开启事务")?;

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {pos} 行 {msg}") {
        pb.set_style(style);
    }

    let mut result = ImportResult::default();

    for record_result in reader.records() {
        result.total_records += 1;
        pb.inc(1);
        match record_result {
            Ok(record) => {
                match parse_record(&record) {
                    Ok(draw) => {
                        match insert_draw(&tx, &draw) {
                            Ok(true) => result.inserted += 1,
                            Ok(false) => result.skipped += 1,
                            Err(e) => {
                                log::warn!("第{}行写入失败: {:#}", result.total_records, e);
                                result.errors += 1;
                            }
                        }
                    }
                    Err(e) => {
                        log::warn!("第{}行解析失败: {:#}", result.total_records, e);
                        result.errors += 1;
                    }
                }
            }
            Err(e) => {
                log::warn!("第{}行读取失败: {}", result.total_records, e);
                result.errors += 1;
            }
        }
    }

    tx.commit().context("提交事务失败")?;
    pb.finish_and_clear();
    log::info!(
        "import {:?}: {} rows, {} inserted, {} skipped, {} errors",
        path, result.total_records, result.inserted, result.skipped, result.errors
    );
    Ok(result)
}
