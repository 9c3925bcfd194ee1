//! `ProcessCoverages` requests: iterator bindings, an optional `where`
//! condition and a `return` clause, compiled into RasQL queries.

use std::collections::BTreeMap;

use tracing::{debug, info};

use wcps_common::{MetadataSource, WcpsError, WcpsResult};

use crate::ast::{CoverageExpr, Operand, ParseContext, ScalarExpr};
use crate::config::CompilerConfig;
use crate::info::CoverageInfo;
use crate::xml::XmlElement;

const WRAPPERS: [&str; 3] = ["ProcessCoveragesRequest", "query", "xmlSyntax"];

/// `coverageIterator`: a variable bound to one or more coverage names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageIterator {
    pub variable: String,
    pub coverages: Vec<String>,
}

/// What the query returns.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnClause {
    Encode {
        expr: CoverageExpr,
        format: String,
        extra: Option<String>,
        store: bool,
    },
    Scalar(ScalarExpr),
}

impl ReturnClause {
    pub fn to_rasql(&self) -> String {
        match self {
            ReturnClause::Encode {
                expr,
                format,
                extra,
                ..
            } => {
                if format.eq_ignore_ascii_case("csv") {
                    return format!("csv({})", expr.to_rasql());
                }
                match extra {
                    Some(extra) => {
                        format!("encode({}, \"{}\", \"{}\")", expr.to_rasql(), format, extra)
                    }
                    None => format!("encode({}, \"{}\")", expr.to_rasql(), format),
                }
            }
            ReturnClause::Scalar(s) => s.to_rasql(),
        }
    }
}

/// A parsed `ProcessCoverages` request.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCoveragesRequest {
    pub iterators: Vec<CoverageIterator>,
    pub condition: Option<Operand>,
    pub ret: ReturnClause,
}

/// One executable query and what it produces.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub rasql: String,
    /// Output format of an encoded coverage; `None` for scalar results.
    pub format: Option<String>,
    pub store: bool,
    /// Schema of the returned coverage; `None` for scalar results.
    pub info: Option<CoverageInfo>,
}

impl ProcessCoveragesRequest {
    /// Parse the request root (the wrapper elements are optional).
    pub fn parse(
        root: &XmlElement,
        source: &dyn MetadataSource,
        config: &CompilerConfig,
    ) -> WcpsResult<ProcessCoveragesRequest> {
        let mut body = root;
        while WRAPPERS.contains(&body.name.as_str()) && body.child("coverageIterator").is_none() {
            body = body.only_child()?;
        }

        let mut iterators = Vec::new();
        for it in body.children_named("coverageIterator") {
            let variable = it.required_child_text("iteratorVar")?.to_string();
            let coverages: Vec<String> = it
                .children_named("coverageName")
                .map(|c| c.text.trim().to_string())
                .collect();
            if coverages.is_empty() {
                return Err(WcpsError::invalid_parameter(
                    "coverageIterator",
                    format!("iterator '{}' names no coverage", variable),
                ));
            }
            if iterators.iter().any(|i: &CoverageIterator| i.variable == variable) {
                return Err(WcpsError::invalid_parameter(
                    "coverageIterator",
                    format!("iterator '{}' is defined twice", variable),
                ));
            }
            iterators.push(CoverageIterator {
                variable,
                coverages,
            });
        }
        if iterators.is_empty() {
            return Err(WcpsError::invalid_parameter(
                &body.name,
                "request declares no coverage iterator",
            ));
        }

        let bindings: BTreeMap<String, Vec<String>> = iterators
            .iter()
            .map(|i| (i.variable.clone(), i.coverages.clone()))
            .collect();
        let ctx = ParseContext::new(source, config, &bindings);

        let condition = match body.child("where") {
            Some(w) => Some(Operand::parse(w.only_child()?, &ctx)?),
            None => None,
        };

        let ret_el = body.child("return").ok_or_else(|| {
            WcpsError::invalid_parameter(&body.name, "request has no <return> clause")
        })?;
        let ret = Self::parse_return(ret_el.only_child()?, &ctx)?;

        Ok(ProcessCoveragesRequest {
            iterators,
            condition,
            ret,
        })
    }

    fn parse_return(element: &XmlElement, ctx: &ParseContext<'_>) -> WcpsResult<ReturnClause> {
        if element.name != "encode" {
            return ScalarExpr::parse(element, ctx).map(ReturnClause::Scalar);
        }

        let expr_el = element
            .children
            .iter()
            .find(|c| c.name != "format" && c.name != "extraParameters")
            .ok_or_else(|| {
                WcpsError::invalid_parameter("encode", "missing coverage expression")
            })?;
        let expr = CoverageExpr::parse(expr_el, ctx)?;
        let format = element
            .child_text("format")
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| ctx.config().default_format.clone());
        let extra = element
            .child_text("extraParameters")
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        let store = element
            .attribute("store")
            .map(|s| s.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(ReturnClause::Encode {
            expr,
            format,
            extra,
            store,
        })
    }

    /// One query per combination of coverage names, iterators varying
    /// rightmost-fastest in declaration order.
    pub fn to_queries(&self) -> Vec<CompiledQuery> {
        let ret = self.ret.to_rasql();
        let where_clause = self
            .condition
            .as_ref()
            .map(|c| format!(" where {}", c.to_rasql()))
            .unwrap_or_default();
        let (format, store, info) = match &self.ret {
            ReturnClause::Encode {
                expr,
                format,
                store,
                ..
            } => (Some(format.clone()), *store, Some(expr.info().clone())),
            ReturnClause::Scalar(_) => (None, false, None),
        };

        let mut combinations: Vec<Vec<(&str, &str)>> = vec![Vec::new()];
        for it in &self.iterators {
            combinations = combinations
                .into_iter()
                .flat_map(|prefix| {
                    it.coverages.iter().map(move |cov| {
                        let mut next = prefix.clone();
                        next.push((cov.as_str(), it.variable.as_str()));
                        next
                    })
                })
                .collect();
        }

        combinations
            .into_iter()
            .map(|bindings| {
                let from: Vec<String> = bindings
                    .iter()
                    .map(|(cov, var)| format!("{} as {}", cov, var))
                    .collect();
                CompiledQuery {
                    rasql: format!("select {} from {}{}", ret, from.join(", "), where_clause),
                    format: format.clone(),
                    store,
                    info: info.clone(),
                }
            })
            .collect()
    }
}

/// Compiles WCPS XML requests against a metadata source.
pub struct WcpsCompiler<'a> {
    source: &'a dyn MetadataSource,
    config: CompilerConfig,
}

impl<'a> WcpsCompiler<'a> {
    pub fn new(source: &'a dyn MetadataSource, config: CompilerConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Parse a request document into its AST.
    pub fn parse(&self, xml: &str) -> WcpsResult<ProcessCoveragesRequest> {
        let root = XmlElement::parse(xml)?;
        ProcessCoveragesRequest::parse(&root, self.source, &self.config)
    }

    /// Compile a request document into RasQL queries.
    pub fn compile(&self, xml: &str) -> WcpsResult<Vec<CompiledQuery>> {
        let request = self.parse(xml)?;
        let queries = request.to_queries();
        for q in &queries {
            debug!(rasql = %q.rasql, "compiled query");
        }
        info!(queries = queries.len(), "compiled WCPS request");
        Ok(queries)
    }
}
