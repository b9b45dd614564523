//! Dataset sources: CSV files and PostgreSQL tables.

use crate::config::{DbArgs, CONTROLLER_COLUMN, NUM_RTUS_COLUMN};
use crate::dataset::Dataset;
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::path::Path;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{error, info};

/// User tables, excluding the system catalogs
const LIST_TABLES_SQL: &str =
    "select relname from pg_class where relkind='r' and relname !~ '^(pg_|sql_)';";

/// Load a CSV file whose first line holds the column names
pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Dataset> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;

    let names: Vec<String> = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {}", path.display()))?
        .iter()
        .map(|s| s.trim().to_string())
        .collect();

    let mut records = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("Malformed CSV record {}", line + 2))?;
        if record.len() > names.len() {
            return Err(anyhow!(
                "CSV record {} has {} fields, header has {}",
                line + 2,
                record.len(),
                names.len()
            ));
        }
        // Short records are padded with nulls
        let mut cells: Vec<Option<String>> = record.iter().map(|s| Some(s.to_string())).collect();
        cells.resize(names.len(), None);
        records.push(cells);
    }

    Ok(Dataset::from_records(names, records)?)
}

/// Open a connection and drive it on a background task
pub async fn connect(db: &DbArgs) -> Result<Client> {
    let mut config = tokio_postgres::Config::new();
    config
        .host(&db.db_host)
        .port(db.db_port)
        .user(&db.db_user)
        .dbname(&db.db_name);
    if let Some(ref password) = db.db_password {
        config.password(password);
    }

    let (client, connection) = config.connect(NoTls).await.with_context(|| {
        format!(
            "Failed to connect to database {} at {}:{} as {}",
            db.db_name, db.db_host, db.db_port, db.db_user
        )
    })?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            error!(error = %e, "database connection error");
        }
    });

    Ok(client)
}

/// Names of the user tables visible through `client`
pub async fn list_tables(client: &Client) -> Result<Vec<String>> {
    let messages = client
        .simple_query(LIST_TABLES_SQL)
        .await
        .context("Failed to list tables")?;

    Ok(messages
        .into_iter()
        .filter_map(|m| match m {
            SimpleQueryMessage::Row(row) => row.get(0).map(str::to_string),
            _ => None,
        })
        .collect())
}

/// Quote a possibly schema-qualified table name
fn quote_table(name: &str) -> String {
    name.split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

/// Select every row of `table`
pub async fn load_table(client: &Client, table: &str) -> Result<Dataset> {
    let tables = list_tables(client).await?;
    info!(?tables, "available tables");

    let sql = format!("SELECT * FROM {};", quote_table(table));
    info!(%sql, "querying");

    let messages = client
        .simple_query(&sql)
        .await
        .with_context(|| format!("Query failed: {}", sql))?;

    let mut names: Option<Vec<String>> = None;
    let mut records: Vec<Vec<Option<String>>> = Vec::new();
    for message in messages {
        match message {
            SimpleQueryMessage::RowDescription(columns) => {
                names = Some(columns.iter().map(|c| c.name().to_string()).collect());
            }
            SimpleQueryMessage::Row(row) => {
                if names.is_none() {
                    names = Some(row.columns().iter().map(|c| c.name().to_string()).collect());
                }
                records.push((0..row.len()).map(|i| row.get(i).map(str::to_string)).collect());
            }
            _ => {}
        }
    }

    Ok(Dataset::from_records(names.unwrap_or_default(), records)?)
}

/// Log the column names of freshly loaded data
pub fn describe(data: &Dataset) {
    info!(columns = %data.column_names().join(" "), rows = data.row_count(), "loaded dataset");
}

/// Distinct controller ids and RTU counts left in a dataset
#[derive(Debug, Default, PartialEq)]
pub struct FilterStats {
    pub controllers: Option<usize>,
    pub num_rtus: Option<BTreeSet<String>>,
}

/// Log the controller/RTU make-up of the data, for columns that exist
pub fn filter_stats(data: &Dataset) -> Result<FilterStats> {
    let mut stats = FilterStats::default();
    if data.has_column(CONTROLLER_COLUMN) {
        let controllers: BTreeSet<String> =
            data.label_keys(CONTROLLER_COLUMN)?.into_iter().flatten().collect();
        info!(total = controllers.len(), "controller_ids included");
        stats.controllers = Some(controllers.len());
    }
    if data.has_column(NUM_RTUS_COLUMN) {
        let rtus: BTreeSet<String> = data.label_keys(NUM_RTUS_COLUMN)?.into_iter().flatten().collect();
        info!(distinct = rtus.len(), values = ?rtus, "num_rtus");
        stats.num_rtus = Some(rtus);
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RowFilters;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_csv_infers_types() {
        let file = csv_file("x,y,label\n1,2.5,a\n3,,b\n5,6,a\n");
        let data = load_csv(file.path()).unwrap();
        assert_eq!(data.row_count(), 3);
        assert_eq!(data.column_names(), &["x", "y", "label"]);
        assert_eq!(data.numeric("x").unwrap(), &[Some(1.0), Some(3.0), Some(5.0)]);
        assert_eq!(data.numeric("y").unwrap(), &[Some(2.5), None, Some(6.0)]);
        assert!(data.numeric("label").is_err());
    }

    #[test]
    fn test_load_csv_pads_short_records() {
        let file = csv_file("a,b\n1,2\n3\n");
        let data = load_csv(file.path()).unwrap();
        assert_eq!(data.numeric("b").unwrap(), &[Some(2.0), None]);
    }

    #[test]
    fn test_load_csv_rejects_long_records() {
        let file = csv_file("a,b\n1,2,3\n");
        assert!(load_csv(file.path()).is_err());
    }

    #[test]
    fn test_load_csv_missing_file() {
        assert!(load_csv("/nonexistent/distplot.csv").is_err());
    }

    #[test]
    fn test_quote_table() {
        assert_eq!(quote_table("car_data_demo"), "\"car_data_demo\"");
        assert_eq!(quote_table("public.trips"), "\"public\".\"trips\"");
        assert_eq!(quote_table("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn test_filter_stats_tolerates_missing_columns() {
        let file = csv_file("x\n1\n");
        let data = load_csv(file.path()).unwrap();
        describe(&data);
        assert_eq!(filter_stats(&data).unwrap(), FilterStats::default());
    }

    #[test]
    fn test_filter_stats_reflect_filtered_rows() {
        let file = csv_file("controller_id,num_rtus\n1,4\n2,4\n3,8\n2,8\n");
        let data = load_csv(file.path()).unwrap();
        assert_eq!(filter_stats(&data).unwrap().controllers, Some(3));

        let filters = RowFilters { num_rtus: Some(8), controller: None };
        let filtered = crate::dispatch::apply_filters(data, &filters).unwrap();
        let stats = filter_stats(&filtered).unwrap();
        assert_eq!(stats.controllers, Some(2));
        assert_eq!(stats.num_rtus, Some(BTreeSet::from(["8".to_string()])));
    }
}
