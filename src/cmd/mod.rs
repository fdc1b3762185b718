use crate::Result;
use std::fmt;

pub mod account;
pub mod aliases;
pub mod domains;
pub mod emails;
pub mod sync;

pub fn print_json<T: ?Sized + serde::Serialize>(value: &T) -> Result {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Format {
    #[default]
    Json,
    Yaml,
    Csv,
}

impl Format {
    pub fn output<W, T>(&self, mut output: W, rows: &[T]) -> Result
    where
        W: std::io::Write,
        T: serde::Serialize,
    {
        match self {
            Self::Json => {
                serde_json::to_writer_pretty(&mut output, rows)?;
                writeln!(output)?;
            }
            Self::Yaml => {
                serde_yaml::to_writer(&mut output, rows)?;
            }
            Self::Csv => {
                let mut serializer = csv::Writer::from_writer(output);
                for row in rows {
                    serializer.serialize(row)?;
                }
                serializer.flush()?;
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for Format {
    type Err = crate::Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        use anyhow::anyhow;
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            "yaml" => Ok(Self::Yaml),
            _ => Err(anyhow!("invalid format {s}")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => f.write_str("csv"),
            Self::Json => f.write_str("json"),
            Self::Yaml => f.write_str("yaml"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Row {
        name: String,
        enabled: bool,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                name: "sales".to_string(),
                enabled: true,
            },
            Row {
                name: "info".to_string(),
                enabled: false,
            },
        ]
    }

    #[test]
    fn format_parsing() {
        assert_eq!("json".parse::<Format>().unwrap(), Format::Json);
        assert_eq!("CSV".parse::<Format>().unwrap(), Format::Csv);
        assert_eq!("yaml".parse::<Format>().unwrap(), Format::Yaml);
        assert!("toml".parse::<Format>().is_err());
    }

    #[test]
    fn csv_output_has_headers() {
        let mut out = Vec::new();
        Format::Csv.output(&mut out, &rows()).expect("csv");
        let csv = String::from_utf8(out).expect("utf8");
        assert!(csv.starts_with("name,enabled\n"));
        assert!(csv.contains("sales,true"));
    }

    #[test]
    fn json_output_is_an_array() {
        let mut out = Vec::new();
        Format::Json.output(&mut out, &rows()).expect("json");
        let parsed: serde_json::Value = serde_json::from_slice(&out).expect("value");
        assert_eq!(parsed.as_array().map(Vec::len), Some(2));
    }
}
