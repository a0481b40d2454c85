//! Front-end query expressions
//!
//! The shape a host query builder produces. The tree is wider than what
//! the translator accepts on purpose: every construct a caller can express
//! is representable, so unsupported ones can be rejected by name instead of
//! being silently dropped.

use std::fmt;

/// Per-query execution options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Requested page size; `None` uses the provider default
    pub page_size: Option<u32>,
    /// Whether to follow continuation tokens; `None` uses the provider default
    pub auto_paginate: Option<bool>,
}

impl QueryOptions {
    /// Overlays `outer` on top of `self`; outer settings win
    pub fn merged_with(self, outer: QueryOptions) -> QueryOptions {
        QueryOptions {
            page_size: outer.page_size.or(self.page_size),
            auto_paginate: outer.auto_paginate.or(self.auto_paginate),
        }
    }
}

/// Query expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum QueryExpression {
    /// Fetch every item of one entity shape
    Scan { entity: String },
    /// Predicate filter
    Filter {
        source: Box<QueryExpression>,
        predicate: String,
    },
    /// Property projection
    Project {
        source: Box<QueryExpression>,
        properties: Vec<String>,
    },
    /// Ordering by a property
    OrderBy {
        source: Box<QueryExpression>,
        property: String,
        descending: bool,
    },
    /// Join with another source
    Join {
        source: Box<QueryExpression>,
        other: Box<QueryExpression>,
        on: String,
    },
    /// Grouping by a key
    GroupBy {
        source: Box<QueryExpression>,
        key: String,
    },
    /// Aggregate function (count, sum, ...)
    Aggregate {
        source: Box<QueryExpression>,
        function: String,
    },
    /// Row limit
    Take {
        source: Box<QueryExpression>,
        count: u64,
    },
    /// Row offset
    Skip {
        source: Box<QueryExpression>,
        count: u64,
    },
    /// Duplicate elimination
    Distinct { source: Box<QueryExpression> },
    /// Execution options annotation (not a query construct)
    Configure {
        source: Box<QueryExpression>,
        options: QueryOptions,
    },
}

impl QueryExpression {
    /// Starts a query over one entity shape
    pub fn scan(entity: impl Into<String>) -> Self {
        QueryExpression::Scan {
            entity: entity.into(),
        }
    }

    pub fn filter(self, predicate: impl Into<String>) -> Self {
        QueryExpression::Filter {
            source: Box::new(self),
            predicate: predicate.into(),
        }
    }

    pub fn select<I, S>(self, properties: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        QueryExpression::Project {
            source: Box::new(self),
            properties: properties.into_iter().map(Into::into).collect(),
        }
    }

    pub fn order_by(self, property: impl Into<String>) -> Self {
        QueryExpression::OrderBy {
            source: Box::new(self),
            property: property.into(),
            descending: false,
        }
    }

    pub fn order_by_descending(self, property: impl Into<String>) -> Self {
        QueryExpression::OrderBy {
            source: Box::new(self),
            property: property.into(),
            descending: true,
        }
    }

    pub fn join(self, other: QueryExpression, on: impl Into<String>) -> Self {
        QueryExpression::Join {
            source: Box::new(self),
            other: Box::new(other),
            on: on.into(),
        }
    }

    pub fn group_by(self, key: impl Into<String>) -> Self {
        QueryExpression::GroupBy {
            source: Box::new(self),
            key: key.into(),
        }
    }

    pub fn aggregate(self, function: impl Into<String>) -> Self {
        QueryExpression::Aggregate {
            source: Box::new(self),
            function: function.into(),
        }
    }

    pub fn take(self, count: u64) -> Self {
        QueryExpression::Take {
            source: Box::new(self),
            count,
        }
    }

    pub fn skip(self, count: u64) -> Self {
        QueryExpression::Skip {
            source: Box::new(self),
            count,
        }
    }

    pub fn distinct(self) -> Self {
        QueryExpression::Distinct {
            source: Box::new(self),
        }
    }

    /// Overrides the page size for this query
    pub fn with_page_size(self, page_size: u32) -> Self {
        self.configure(QueryOptions {
            page_size: Some(page_size),
            auto_paginate: None,
        })
    }

    /// Returns only the first page; continuation tokens are not followed
    pub fn without_pagination(self) -> Self {
        self.configure(QueryOptions {
            page_size: None,
            auto_paginate: Some(false),
        })
    }

    pub fn configure(self, options: QueryOptions) -> Self {
        QueryExpression::Configure {
            source: Box::new(self),
            options,
        }
    }

    /// Construct name used in error messages
    pub fn construct_name(&self) -> &'static str {
        match self {
            QueryExpression::Scan { .. } => "scan",
            QueryExpression::Filter { .. } => "filter",
            QueryExpression::Project { .. } => "projection",
            QueryExpression::OrderBy { .. } => "ordering",
            QueryExpression::Join { .. } => "join",
            QueryExpression::GroupBy { .. } => "grouping",
            QueryExpression::Aggregate { .. } => "aggregation",
            QueryExpression::Take { .. } => "limit",
            QueryExpression::Skip { .. } => "offset",
            QueryExpression::Distinct { .. } => "distinct",
            QueryExpression::Configure { .. } => "configure",
        }
    }

    /// Immediate source, if this node wraps one
    pub fn source(&self) -> Option<&QueryExpression> {
        match self {
            QueryExpression::Scan { .. } => None,
            QueryExpression::Filter { source, .. }
            | QueryExpression::Project { source, .. }
            | QueryExpression::OrderBy { source, .. }
            | QueryExpression::Join { source, .. }
            | QueryExpression::GroupBy { source, .. }
            | QueryExpression::Aggregate { source, .. }
            | QueryExpression::Take { source, .. }
            | QueryExpression::Skip { source, .. }
            | QueryExpression::Distinct { source }
            | QueryExpression::Configure { source, .. } => Some(source),
        }
    }

    /// Entity shape at the root of the source chain
    pub fn root_entity(&self) -> &str {
        match self {
            QueryExpression::Scan { entity } => entity,
            other => match other.source() {
                Some(source) => source.root_entity(),
                None => "",
            },
        }
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpression::Scan { entity } => write!(f, "scan({})", entity),
            QueryExpression::Filter { source, predicate } => {
                write!(f, "{}.filter({})", source, predicate)
            }
            QueryExpression::Project { source, properties } => {
                write!(f, "{}.select({})", source, properties.join(", "))
            }
            QueryExpression::OrderBy {
                source,
                property,
                descending,
            } => {
                let direction = if *descending { "desc" } else { "asc" };
                write!(f, "{}.order_by({} {})", source, property, direction)
            }
            QueryExpression::Join { source, other, on } => {
                write!(f, "{}.join({} on {})", source, other, on)
            }
            QueryExpression::GroupBy { source, key } => write!(f, "{}.group_by({})", source, key),
            QueryExpression::Aggregate { source, function } => {
                write!(f, "{}.aggregate({})", source, function)
            }
            QueryExpression::Take { source, count } => write!(f, "{}.take({})", source, count),
            QueryExpression::Skip { source, count } => write!(f, "{}.skip({})", source, count),
            QueryExpression::Distinct { source } => write!(f, "{}.distinct()", source),
            QueryExpression::Configure { source, .. } => write!(f, "{}", source),
        }
    }
}
