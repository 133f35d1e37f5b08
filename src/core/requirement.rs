//! Requirement strings.
//!
//! A requirement string follows the registry grammar
//! `NAME [EXTRAS] [(OPERATOR VERSION[, OPERATOR VERSION ...])] [; MARKER]`.
//! Parsing here only extracts the identifier and its version clauses; the
//! marker is split off by [`split_marker`] and classified in
//! [`crate::core::marker`].

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::core::name::is_valid_project_name;

/// Identifier followed by whatever constraint text remains.
static NAME_AND_REST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?)\s*(.*)$").unwrap()
});

/// A single `OPERATOR VERSION` clause.
static CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(~=|==|!=|<=|>=|<|>)\s*([A-Za-z0-9][A-Za-z0-9.*+!_-]*)$").unwrap()
});

/// Failure to turn one requirement string into a [`Requirement`].
///
/// Both kinds are per-line: callers log and skip the requirement.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequirementError {
    #[error("malformed requirement `{requirement}`")]
    Malformed { requirement: String },

    #[error("unsupported marker `{marker}` in requirement `{requirement}`")]
    UnsupportedMarker { requirement: String, marker: String },
}

/// Version comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionOp {
    /// `==`
    Eq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `~=`
    Compatible,
}

impl VersionOp {
    /// The operator as written in requirement strings.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionOp::Eq => "==",
            VersionOp::NotEq => "!=",
            VersionOp::Lt => "<",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Ge => ">=",
            VersionOp::Compatible => "~=",
        }
    }

    /// The prefix used in a dependency atom.
    pub fn atom_prefix(&self) -> &'static str {
        match self {
            VersionOp::Eq => "=",
            VersionOp::NotEq => "!=",
            VersionOp::Lt => "<",
            VersionOp::Le => "<=",
            VersionOp::Gt => ">",
            VersionOp::Ge => ">=",
            VersionOp::Compatible => "~",
        }
    }
}

impl fmt::Display for VersionOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "==" => Ok(VersionOp::Eq),
            "!=" => Ok(VersionOp::NotEq),
            "<" => Ok(VersionOp::Lt),
            "<=" => Ok(VersionOp::Le),
            ">" => Ok(VersionOp::Gt),
            ">=" => Ok(VersionOp::Ge),
            "~=" => Ok(VersionOp::Compatible),
            _ => Err(format!("unknown version operator `{}`", s)),
        }
    }
}

/// One `OPERATOR VERSION` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionClause {
    pub op: VersionOp,
    pub version: String,
}

impl VersionClause {
    pub fn new(op: VersionOp, version: impl Into<String>) -> Self {
        VersionClause {
            op,
            version: version.into(),
        }
    }
}

impl fmt::Display for VersionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.op, self.version)
    }
}

/// A parsed dependency requirement: identifier plus ordered version clauses.
///
/// An empty clause list means "any version"; an operator never exists
/// without a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    name: String,
    clauses: Vec<VersionClause>,
}

impl Requirement {
    /// A requirement on any version of `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Requirement {
            name: name.into(),
            clauses: Vec::new(),
        }
    }

    /// Add a version clause.
    pub fn with_clause(mut self, op: VersionOp, version: impl Into<String>) -> Self {
        self.clauses.push(VersionClause::new(op, version));
        self
    }

    /// Parse one requirement string.
    ///
    /// Anything after the first `;` is ignored and the extras list is
    /// discarded. Every comma-separated clause is kept, in order.
    pub fn parse(raw: &str) -> Result<Self, RequirementError> {
        let malformed = || RequirementError::Malformed {
            requirement: raw.to_string(),
        };

        let (head, _) = split_marker(raw);
        let head = strip_extras(head).ok_or_else(malformed)?;
        let head = head.trim();

        let caps = NAME_AND_REST.captures(head).ok_or_else(malformed)?;
        let name = caps[1].to_string();
        let rest = caps[2].trim();

        if rest.is_empty() {
            if !is_valid_project_name(&name) {
                return Err(malformed());
            }
            return Ok(Requirement::new(name));
        }

        let rest = match rest.strip_prefix('(') {
            Some(inner) => inner.strip_suffix(')').ok_or_else(malformed)?.trim(),
            None => rest,
        };

        let mut clauses = Vec::new();
        for clause in rest.split(',') {
            let clause = clause.trim();
            let caps = CLAUSE.captures(clause).ok_or_else(malformed)?;
            let op = caps[1].parse::<VersionOp>().map_err(|_| malformed())?;
            clauses.push(VersionClause::new(op, &caps[2]));
        }

        Ok(Requirement { name, clauses })
    }

    /// The project identifier, as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All version clauses in declaration order.
    pub fn clauses(&self) -> &[VersionClause] {
        &self.clauses
    }

    /// Operator of the first clause, if any.
    pub fn operator(&self) -> Option<VersionOp> {
        self.clauses.first().map(|c| c.op)
    }

    /// Version of the first clause, if any.
    pub fn version(&self) -> Option<&str> {
        self.clauses.first().map(|c| c.version.as_str())
    }

    /// Whether the requirement accepts any version.
    pub fn is_unconstrained(&self) -> bool {
        self.clauses.is_empty()
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.clauses.is_empty() {
            let clauses: Vec<String> = self.clauses.iter().map(|c| c.to_string()).collect();
            write!(f, " ({})", clauses.join(","))?;
        }
        Ok(())
    }
}

/// Split a requirement string at the first `;`.
///
/// Returns the trimmed requirement part and the trimmed marker, if one exists.
pub fn split_marker(raw: &str) -> (&str, Option<&str>) {
    match raw.split_once(';') {
        Some((head, marker)) => (head.trim(), Some(marker.trim())),
        None => (raw.trim(), None),
    }
}

/// Remove a `[extra,...]` list. `None` if the bracket is never closed.
fn strip_extras(head: &str) -> Option<String> {
    match head.find('[') {
        Some(open) => {
            let close = head[open..].find(']')? + open;
            Some(format!("{}{}", &head[..open], &head[close + 1..]))
        }
        None => Some(head.to_string()),
    }
}
