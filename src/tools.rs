//! Query tool registry.
//!
//! The catalog is exposed as a fixed set of read-only tools, one per
//! predicate. Each tool takes zero or one parameter, queries the
//! [`CatalogStore`], and returns the matching records as a JSON array text
//! payload (possibly `[]`).
//!
//! | Tool | Parameter | Predicate |
//! |------|-----------|-----------|
//! | `list_all` | none | all records |
//! | `get_by_id` | `id: int` | exact id |
//! | `search_by_name` | `name: string` | name contains, case-insensitive |
//! | `filter_by_category` | `category: string` | category equals, case-insensitive |
//! | `filter_by_ingredient` | `ingredient: string` | primary ingredient contains |
//! | `filter_by_max_calories` | `maxCalories: int` | calories set and `<=` |
//! | `filter_by_origin` | `origin: string` | origin region contains |
//!
//! A missing, blank, or mistyped parameter is a [`ToolError::InvalidArgument`];
//! tools never fall back to returning the whole catalog.
//!
//! Custom tools implement [`Tool`] and are added with
//! [`ToolRegistry::register`].

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;

use beverage_mcp_core::decode::json_type_name;
use beverage_mcp_core::store::{BeverageFilter, CatalogStore};

/// Tool arguments: parameter name → scalar JSON value.
pub type ToolArgs = Map<String, Value>;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("no tool registered with name: {0}")]
    UnknownTool(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("catalog store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A named, read-only catalog operation.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as used in `tools/call`.
    fn name(&self) -> &str;

    /// One-line description for `tools/list`.
    fn description(&self) -> &str;

    /// JSON Schema (`type: "object"`) for the arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool and return the text payload of the single content block.
    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError>;
}

/// Per-call access to the catalog for tools.
#[derive(Clone)]
pub struct ToolContext {
    store: Arc<dyn CatalogStore>,
}

impl ToolContext {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn CatalogStore {
        self.store.as_ref()
    }

    /// Run `filter` and serialize the records as a JSON array.
    pub async fn query_json(&self, filter: &BeverageFilter) -> Result<String, ToolError> {
        let records = self.store.query(filter).await?;
        Ok(serde_json::to_string(&records)?)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Built-in catalog tools
// ═══════════════════════════════════════════════════════════════════════

/// Type of a tool's single parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    String,
    Integer,
}

impl ParamKind {
    fn schema_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
        }
    }
}

/// The fixed catalog operation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogTool {
    ListAll,
    GetById,
    SearchByName,
    FilterByCategory,
    FilterByIngredient,
    FilterByMaxCalories,
    FilterByOrigin,
}

impl CatalogTool {
    pub const ALL: [CatalogTool; 7] = [
        CatalogTool::ListAll,
        CatalogTool::GetById,
        CatalogTool::SearchByName,
        CatalogTool::FilterByCategory,
        CatalogTool::FilterByIngredient,
        CatalogTool::FilterByMaxCalories,
        CatalogTool::FilterByOrigin,
    ];

    pub fn tool_name(self) -> &'static str {
        match self {
            CatalogTool::ListAll => "list_all",
            CatalogTool::GetById => "get_by_id",
            CatalogTool::SearchByName => "search_by_name",
            CatalogTool::FilterByCategory => "filter_by_category",
            CatalogTool::FilterByIngredient => "filter_by_ingredient",
            CatalogTool::FilterByMaxCalories => "filter_by_max_calories",
            CatalogTool::FilterByOrigin => "filter_by_origin",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.tool_name() == name)
    }

    /// The single parameter this tool requires, if any.
    pub fn parameter(self) -> Option<(&'static str, ParamKind)> {
        match self {
            CatalogTool::ListAll => None,
            CatalogTool::GetById => Some(("id", ParamKind::Integer)),
            CatalogTool::SearchByName => Some(("name", ParamKind::String)),
            CatalogTool::FilterByCategory => Some(("category", ParamKind::String)),
            CatalogTool::FilterByIngredient => Some(("ingredient", ParamKind::String)),
            CatalogTool::FilterByMaxCalories => Some(("maxCalories", ParamKind::Integer)),
            CatalogTool::FilterByOrigin => Some(("origin", ParamKind::String)),
        }
    }

    fn summary(self) -> &'static str {
        match self {
            CatalogTool::ListAll => "List every beverage in the catalog",
            CatalogTool::GetById => "Get the beverage with the given id (0 or 1 results)",
            CatalogTool::SearchByName => "Search beverages whose name contains the text (case-insensitive)",
            CatalogTool::FilterByCategory => "Filter beverages by category (case-insensitive exact match)",
            CatalogTool::FilterByIngredient => "Filter beverages whose primary ingredient contains the text",
            CatalogTool::FilterByMaxCalories => "Filter beverages with at most the given calories per serving",
            CatalogTool::FilterByOrigin => "Filter beverages whose origin region contains the text",
        }
    }

    fn parameter_description(self) -> &'static str {
        match self {
            CatalogTool::ListAll => "",
            CatalogTool::GetById => "Beverage id",
            CatalogTool::SearchByName => "Name fragment",
            CatalogTool::FilterByCategory => "Category, e.g. Tea",
            CatalogTool::FilterByIngredient => "Ingredient fragment",
            CatalogTool::FilterByMaxCalories => "Calorie ceiling (inclusive)",
            CatalogTool::FilterByOrigin => "Origin region fragment",
        }
    }

    /// Validate `args` and build the store predicate.
    pub fn filter(self, args: &ToolArgs) -> Result<BeverageFilter, ToolError> {
        let Some((param, kind)) = self.parameter() else {
            return Ok(BeverageFilter::All);
        };
        let filter = match kind {
            ParamKind::String => {
                let v = required_string(args, param)?;
                match self {
                    CatalogTool::SearchByName => BeverageFilter::NameContains(v),
                    CatalogTool::FilterByCategory => BeverageFilter::Category(v),
                    CatalogTool::FilterByIngredient => BeverageFilter::IngredientContains(v),
                    _ => BeverageFilter::OriginContains(v),
                }
            }
            ParamKind::Integer => {
                let v = required_integer(args, param)?;
                match self {
                    CatalogTool::GetById => BeverageFilter::Id(v),
                    _ => BeverageFilter::MaxCalories(v),
                }
            }
        };
        Ok(filter)
    }
}

fn required_string(args: &ToolArgs, param: &str) -> Result<String, ToolError> {
    match args.get(param) {
        None | Some(Value::Null) => Err(ToolError::InvalidArgument(format!(
            "missing required parameter: {}",
            param
        ))),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ToolError::InvalidArgument(
            format!("{} must not be empty", param),
        )),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(ToolError::InvalidArgument(format!(
            "parameter '{}' must be of type 'string', got {}",
            param,
            json_type_name(other)
        ))),
    }
}

fn required_integer(args: &ToolArgs, param: &str) -> Result<i64, ToolError> {
    match args.get(param) {
        None | Some(Value::Null) => Err(ToolError::InvalidArgument(format!(
            "missing required parameter: {}",
            param
        ))),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(|| {
            ToolError::InvalidArgument(format!("parameter '{}' must be an integer, got {}", param, n))
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| {
            ToolError::InvalidArgument(format!(
                "parameter '{}' must be an integer, got '{}'",
                param, s
            ))
        }),
        Some(other) => Err(ToolError::InvalidArgument(format!(
            "parameter '{}' must be of type 'integer', got {}",
            param,
            json_type_name(other)
        ))),
    }
}

#[async_trait]
impl Tool for CatalogTool {
    fn name(&self) -> &str {
        self.tool_name()
    }

    fn description(&self) -> &str {
        self.summary()
    }

    fn parameters_schema(&self) -> Value {
        match self.parameter() {
            None => json!({ "type": "object", "properties": {} }),
            Some((param, kind)) => json!({
                "type": "object",
                "properties": {
                    param: { "type": kind.schema_type(), "description": self.parameter_description() }
                },
                "required": [param]
            }),
        }
    }

    async fn execute(&self, args: &ToolArgs, ctx: &ToolContext) -> Result<String, ToolError> {
        let filter = self.filter(args)?;
        ctx.query_json(&filter).await
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Registry
// ═══════════════════════════════════════════════════════════════════════

/// Name-indexed set of tools.
///
/// ```rust
/// use beverage_mcp::tools::ToolRegistry;
///
/// let tools = ToolRegistry::with_builtins();
/// assert!(tools.find("search_by_name").is_some());
/// ```
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty tool registry.
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Create a registry holding the seven catalog tools.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for t in CatalogTool::ALL {
            registry.register(Box::new(t));
        }
        registry
    }

    /// Register a tool. A tool with the same name is replaced.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.retain(|t| t.name() != tool.name());
        self.tools.push(tool);
    }

    pub fn tools(&self) -> &[Box<dyn Tool>] {
        &self.tools
    }

    pub fn into_tools(self) -> Vec<Box<dyn Tool>> {
        self.tools
    }

    pub fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.name() == name)
            .map(|t| t.as_ref())
    }

    /// Resolve `name` and execute it.
    pub async fn call(
        &self,
        name: &str,
        args: &ToolArgs,
        ctx: &ToolContext,
    ) -> Result<String, ToolError> {
        let tool = self
            .find(name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.execute(args, ctx).await
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
