//! Name resolution and definition checks.
//!
//! Every expression in a template is parsed from its source text and each
//! reference is bound to a positional slot. Anything that fails to bind is
//! reported as a [`Finding`]; an expression only receives its compiled form
//! when it resolved cleanly.

use crate::error::DefinitionError;
use crate::model::*;
use banded_expr::{Binding, Builtin, Expression, FormatSpec, RefKind, Reference, parse_expression};
use banded_types::{FieldSlot, GroupId, ParameterSlot, ValueType, VariableSlot};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A machine-readable diagnostic about a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub code: &'static str,
    pub severity: Severity,
    /// The declared or referenced name the finding is about.
    pub name: String,
    /// Where in the template, e.g. `band:detail/element[2]` or `variable:Total`.
    pub location: String,
    pub message: String,
}

impl Finding {
    pub fn error(
        code: &'static str,
        name: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Error,
            name: name.into(),
            location: location.into(),
            message: message.into(),
        }
    }

    pub fn warning(
        code: &'static str,
        name: impl Into<String>,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(code, name, location, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn from_definition_error(err: &DefinitionError) -> Self {
        match err {
            DefinitionError::Xml(e) => Finding::error("malformed", "", "document", e.to_string()),
            DefinitionError::Malformed { location, message } => {
                Finding::error("malformed", "", location.clone(), message.clone())
            }
            DefinitionError::UnknownBandKind { name, location } => Finding::error(
                "unknown-band",
                name.clone(),
                location.clone(),
                format!("unknown band kind '{}'", name),
            ),
            DefinitionError::Invalid(findings) => findings
                .iter()
                .find(|f| f.is_error())
                .cloned()
                .unwrap_or_else(|| Finding::error("invalid", "", "document", err.to_string())),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}[{}] {}: {}", level, self.code, self.location, self.message)
    }
}

/// Which names an expression site may see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Evaluated before any row exists: parameter defaults and initial values.
    ParametersOnly,
    /// Evaluated per row; `PAGE_COUNT` is not known yet.
    Row,
    /// Text elements, whose resolution can wait for the final page count.
    Element,
}

struct Site<'a> {
    location: &'a str,
    owner: &'a str,
    scope: Scope,
}

#[derive(Default)]
struct NameTable {
    fields: HashMap<String, usize>,
    variables: HashMap<String, usize>,
    parameters: HashMap<String, usize>,
    groups: HashMap<String, usize>,
}

impl NameTable {
    fn build(template: &Template, findings: &mut Vec<Finding>) -> Self {
        let mut table = NameTable::default();
        declare(
            &mut table.fields,
            template.fields.iter().map(|f| f.name.as_str()),
            "field",
            findings,
        );
        declare(
            &mut table.parameters,
            template.parameters.iter().map(|p| p.name.as_str()),
            "parameter",
            findings,
        );
        declare(
            &mut table.variables,
            template.variables.iter().map(|v| v.name.as_str()),
            "variable",
            findings,
        );
        declare(
            &mut table.groups,
            template.groups.iter().map(|g| g.name.as_str()),
            "group",
            findings,
        );
        for variable in &template.variables {
            if Builtin::from_name(&variable.name).is_some() {
                findings.push(Finding::error(
                    "builtin-collision",
                    variable.name.clone(),
                    format!("variable:{}", variable.name),
                    format!("'{}' is a built-in name", variable.name),
                ));
            }
        }
        table
    }

    fn bind(&self, reference: &Reference, site: &Site<'_>) -> Result<Binding, Finding> {
        let scope_error = || {
            Finding::error(
                "invalid-scope",
                reference.name.clone(),
                site.location,
                format!(
                    "{} cannot be used in '{}', which is evaluated before any row is read",
                    reference, site.owner
                ),
            )
        };
        let undeclared = || {
            Finding::error(
                "undeclared-reference",
                reference.name.clone(),
                site.location,
                format!("{} is not declared", reference),
            )
        };
        let row_bound = site.scope != Scope::ParametersOnly;
        match reference.kind {
            RefKind::Field if !row_bound => Err(scope_error()),
            RefKind::Variable if !row_bound => Err(scope_error()),
            RefKind::Builtin if !row_bound => Err(scope_error()),
            RefKind::Field => self
                .fields
                .get(&reference.name)
                .map(|&i| Binding::Field(FieldSlot::new(i)))
                .ok_or_else(undeclared),
            RefKind::Variable => self
                .variables
                .get(&reference.name)
                .map(|&i| Binding::Variable(VariableSlot::new(i)))
                .ok_or_else(undeclared),
            RefKind::Parameter => self
                .parameters
                .get(&reference.name)
                .map(|&i| Binding::Parameter(ParameterSlot::new(i)))
                .ok_or_else(undeclared),
            RefKind::Builtin => Builtin::from_name(&reference.name)
                .map(Binding::Builtin)
                .ok_or_else(undeclared),
        }
    }

    /// Parses and binds one expression, recording every problem found.
    fn compile(&self, expr: &mut Expr, site: &Site<'_>, findings: &mut Vec<Finding>) {
        expr.set_compiled(None);
        let mut ast = match parse_expression(expr.source()) {
            Ok(ast) => ast,
            Err(e) => {
                findings.push(Finding::error("syntax", site.owner, site.location, e.to_string()));
                return;
            }
        };

        let before = findings.len();
        ast.for_each_reference_mut(&mut |r: &mut Reference| match self.bind(r, site) {
            Ok(binding) => r.binding = binding,
            Err(finding) => findings.push(finding),
        });
        ast.for_each_call(&mut |call: &Expression| {
            let Expression::Call {
                name,
                function,
                args,
            } = call
            else {
                return;
            };
            match function {
                None => findings.push(Finding::error(
                    "unknown-function",
                    name.clone(),
                    site.location,
                    format!("unknown function '{}'", name),
                )),
                Some(f) if !f.arity().accepts(args.len()) => findings.push(Finding::error(
                    "arity",
                    name.clone(),
                    site.location,
                    format!(
                        "'{}' expects {} argument(s), got {}",
                        name,
                        f.arity(),
                        args.len()
                    ),
                )),
                Some(_) => {}
            }
        });
        if site.scope == Scope::Row && ast.references_builtin(Builtin::PageCount) {
            findings.push(Finding::error(
                "page-count-scope",
                Builtin::PageCount.name(),
                site.location,
                format!(
                    "PAGE_COUNT is only known after pagination and cannot be used in '{}'",
                    site.owner
                ),
            ));
        }
        if findings.len() == before {
            expr.set_compiled(Some(ast));
        }
    }

    fn compile_band(&self, band: &mut Band, band_location: &str, findings: &mut Vec<Finding>) {
        if let Some(condition) = &mut band.print_when {
            let site = Site {
                location: band_location,
                owner: band.kind.name(),
                scope: Scope::Row,
            };
            self.compile(condition, &site, findings);
        }
        for (index, element) in band.elements.iter_mut().enumerate() {
            let location = format!("{}/element[{}]", band_location, index);
            let owner = element.kind.name();
            if let Some(condition) = &mut element.print_when {
                let site = Site {
                    location: &location,
                    owner,
                    scope: Scope::Row,
                };
                self.compile(condition, &site, findings);
            }
            let site = Site {
                location: &location,
                owner,
                scope: Scope::Element,
            };
            match &mut element.kind {
                ElementKind::TextField(field) => {
                    self.compile(&mut field.expression, &site, findings);
                    field.format = match field.pattern.as_deref() {
                        None => FormatSpec::Plain,
                        Some(pattern) => pattern.parse().unwrap_or_else(|message: String| {
                            findings.push(Finding::error(
                                "invalid-format",
                                pattern,
                                location.clone(),
                                message,
                            ));
                            FormatSpec::Plain
                        }),
                    };
                }
                ElementKind::Image {
                    expression: Some(expr),
                } => self.compile(expr, &site, findings),
                _ => {}
            }
        }
    }
}

fn declare<'a>(
    table: &mut HashMap<String, usize>,
    names: impl Iterator<Item = &'a str>,
    namespace: &str,
    findings: &mut Vec<Finding>,
) {
    for (index, name) in names.enumerate() {
        if table.contains_key(name) {
            findings.push(Finding::error(
                "duplicate-name",
                name,
                format!("{}:{}", namespace, name),
                format!("{} '{}' is declared more than once", namespace, name),
            ));
        } else {
            table.insert(name.to_string(), index);
        }
    }
}

/// Resolves every expression of `template` in place and returns the findings.
/// The template is ready to render exactly when no finding is an error.
pub fn resolve(template: &mut Template) -> Vec<Finding> {
    let mut findings = Vec::new();
    let names = NameTable::build(template, &mut findings);

    for (index, sort) in template.sort_fields.iter().enumerate() {
        if !names.fields.contains_key(&sort.name) {
            findings.push(Finding::error(
                "unknown-sort-field",
                sort.name.clone(),
                format!("sortField[{}]", index),
                format!("sort field '{}' is not a declared field", sort.name),
            ));
        }
    }

    for parameter in &mut template.parameters {
        let location = format!("parameter:{}", parameter.name);
        if let Some(default) = &mut parameter.default {
            let site = Site {
                location: &location,
                owner: &parameter.name,
                scope: Scope::ParametersOnly,
            };
            names.compile(default, &site, &mut findings);
        }
    }

    for variable in &mut template.variables {
        let location = format!("variable:{}", variable.name);
        resolve_variable(variable, &names, &location, &mut findings);
    }

    for group in &mut template.groups {
        let location = format!("group:{}", group.name);
        let site = Site {
            location: &location,
            owner: &group.name,
            scope: Scope::Row,
        };
        names.compile(&mut group.expression, &site, &mut findings);
        for band in [&mut group.header, &mut group.footer].into_iter().flatten() {
            let band_location = format!("group:{}/{}", group.name, band.kind.name());
            names.compile_band(band, &band_location, &mut findings);
        }
    }

    for band in template.bands.iter_mut() {
        let band_location = format!("band:{}", band.kind.name());
        names.compile_band(band, &band_location, &mut findings);
    }

    findings
}

fn resolve_variable(
    variable: &mut Variable,
    names: &NameTable,
    location: &str,
    findings: &mut Vec<Finding>,
) {
    variable.reset_group = None;
    if let ResetScope::Group(group) = &variable.reset {
        match names.groups.get(group) {
            Some(&index) => variable.reset_group = Some(GroupId::new(index)),
            None => findings.push(Finding::error(
                "unknown-group",
                group.clone(),
                location,
                format!("reset group '{}' is not declared", group),
            )),
        }
    }

    if matches!(variable.calculation, Calculation::Sum | Calculation::Average)
        && variable.value_type != ValueType::Number
    {
        findings.push(Finding::error(
            "non-numeric-aggregate",
            variable.name.clone(),
            location,
            format!(
                "{} of a {} variable; only numbers can be summed or averaged",
                variable.calculation.name(),
                variable.value_type
            ),
        ));
    }

    let needs_expression = !matches!(variable.calculation, Calculation::None | Calculation::Count);
    match &mut variable.expression {
        Some(expr) => {
            let site = Site {
                location,
                owner: &variable.name,
                scope: Scope::Row,
            };
            names.compile(expr, &site, findings);
        }
        None if needs_expression => findings.push(Finding::error(
            "missing-expression",
            variable.name.clone(),
            location,
            format!(
                "a {} variable needs a <variableExpression>",
                variable.calculation.name()
            ),
        )),
        None => {}
    }
    if let Some(initial) = &mut variable.initial_value {
        let site = Site {
            location,
            owner: &variable.name,
            scope: Scope::ParametersOnly,
        };
        names.compile(initial, &site, findings);
    }
}
