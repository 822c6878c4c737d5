//! Search index commands (`FT.*`).

use super::Command;
use serde::Deserialize;

/// Storage type of an indexed field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Tag,
    Numeric,
    Geo,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Tag => "TAG",
            FieldType::Numeric => "NUMERIC",
            FieldType::Geo => "GEO",
        }
    }
}

/// One entry of an index schema.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub store: FieldType,
    #[serde(default)]
    pub sortable: bool,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, store: FieldType) -> Self {
        SchemaField {
            name: name.into(),
            store,
            sortable: false,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

pub fn ft_list() -> Command {
    Command::new("FT._LIST")
}

pub fn ft_dropindex(index: &str) -> Command {
    Command::new("FT.DROPINDEX").arg(index)
}

/// `FT.CREATE index ON HASH PREFIX 1 prefix SCHEMA field TYPE [SORTABLE] ...`
pub fn ft_create(index: &str, prefix: &str, schema: &[SchemaField]) -> Command {
    let mut cmd = Command::new("FT.CREATE")
        .arg(index)
        .args(["ON", "HASH", "PREFIX", "1"])
        .arg(prefix)
        .arg("SCHEMA");
    for field in schema {
        cmd = cmd
            .arg(&field.name)
            .arg(field.store.as_str())
            .flag("SORTABLE", field.sortable);
    }
    cmd
}

/// `FT.SEARCH index query LIMIT offset limit [RETURN n field ...]`
pub fn ft_search(index: &str, query: &str, offset: usize, limit: usize, populate: Option<&[String]>) -> Command {
    let cmd = Command::new("FT.SEARCH")
        .arg(index)
        .arg(query)
        .arg("LIMIT")
        .arg(offset)
        .arg(limit);
    match populate {
        Some(fields) => cmd.arg("RETURN").arg(fields.len()).args(fields),
        None => cmd,
    }
}
