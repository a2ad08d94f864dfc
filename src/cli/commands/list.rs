use crate::cli::commands::{print_record_row, print_records_header};
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::query::{RecordQuery, SortOrder};
use crate::open_store;
use crate::utils::date;
use chrono::NaiveDate;

fn parse(s: &str) -> AppResult<NaiveDate> {
    date::parse_date(s).ok_or_else(|| AppError::InvalidDate(s.to_string()))
}

pub(crate) fn build_query(
    on: Option<&str>,
    from: Option<&str>,
    to: Option<&str>,
    limit: Option<usize>,
    desc: bool,
) -> AppResult<RecordQuery> {
    let mut q = match (from, to, on) {
        (Some(f), Some(t), _) => {
            let (start, end) = (parse(f)?, parse(t)?);
            if start > end {
                return Err(AppError::InvalidDate(format!("{} is after {}", f, t)));
            }
            RecordQuery::between(start, end)
        }
        (_, _, Some(d)) => RecordQuery::on(parse(d)?),
        _ => RecordQuery::all(),
    };

    if let Some(n) = limit {
        q = q.limit(n);
    }
    if desc {
        q = q.order(SortOrder::Desc);
    }
    Ok(q)
}

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::List {
        date,
        from,
        to,
        limit,
        desc,
    } = cmd
    {
        let q = build_query(
            date.as_deref(),
            from.as_deref(),
            to.as_deref(),
            *limit,
            *desc,
        )?;

        let store = open_store(cfg)?;
        let records = store.query(&q)?;

        if records.is_empty() {
            println!("No records found.");
            return Ok(());
        }

        print_records_header();
        for rec in &records {
            print_record_row(rec);
        }
    }
    Ok(())
}
