//! Public types for the engine facade.

/// How a model maps onto the relational table and the remote application.
///
/// ```
/// use opensearch_sync::Searchable;
///
/// let goods = Searchable::new("goods", "goods_id").searchable_as("goods_prod");
/// assert_eq!(goods.searchable_as.as_deref(), Some("goods_prod"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Searchable {
    /// Relational table and remote table name
    pub table: String,
    /// Primary key column
    pub key_name: String,
    /// Remote application name; falls back to the configured app name, then
    /// to the table name
    pub searchable_as: Option<String>,
}

impl Searchable {
    pub fn new(table: impl Into<String>, key_name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            key_name: key_name.into(),
            searchable_as: None,
        }
    }

    pub fn searchable_as(mut self, app_name: impl Into<String>) -> Self {
        self.searchable_as = Some(app_name.into());
        self
    }

    /// Resolve the remote application name
    pub fn app_name(&self, configured: Option<&str>) -> String {
        self.searchable_as
            .as_deref()
            .or(configured)
            .unwrap_or(&self.table)
            .to_string()
    }
}
