//! Declaration file parsing
//!
//! One `SourceFile` is one parsed HCL declaration file. Parsing walks the
//! HCL body structurally instead of using serde derive: the block set is
//! small and walking gives precise per-attribute errors with the file
//! path attached.
//!
//! Recognized blocks:
//! - `module { source, version }`
//! - `dependency "<name>" { source, separate_environment, environment_variables { ... } }`
//! - `hook "<name>" { command, script, trigger_on, args }`
//! - `inputs { ... }` (attributes kept as unevaluated expressions)
//! - `environment_variables { ... }`

use crate::dependency::Dependency;
use crate::error::{Error, Result};
use crate::hook::Hook;
use crate::module::ModuleBlock;
use hcl::eval::{Context, Evaluate};
use hcl::{Block, Body, Expression, Value};
use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

/// One parsed declaration file
#[derive(Debug, Clone, Default)]
pub struct SourceFile {
    /// Path the file was read from
    pub path: PathBuf,

    /// `module` block, if declared
    pub module: Option<ModuleBlock>,

    /// `dependency` blocks in declaration order
    pub dependencies: Vec<Dependency>,

    /// `hook` blocks in declaration order
    pub hooks: Vec<Hook>,

    /// `inputs` attributes as raw expressions
    pub inputs: IndexMap<String, Expression>,

    /// `environment_variables` attributes
    pub environment: IndexMap<String, String>,
}

impl SourceFile {
    /// Read and parse a declaration file from disk
    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(path, &content)
    }

    /// Parse declaration file content
    pub fn parse(path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let path = path.into();
        let body = hcl::parse(content).map_err(|e| Error::Parse {
            path: path.clone(),
            source: e,
        })?;

        let mut file = SourceFile {
            path,
            ..SourceFile::default()
        };

        for block in body.blocks() {
            match block.identifier.as_str() {
                "module" => file.module = Some(parse_module(&file.path, block)?),
                "dependency" => {
                    let dep = parse_dependency(&file.path, block)?;
                    file.dependencies.push(dep);
                }
                "hook" => file.hooks.push(parse_hook(&file.path, block)?),
                "inputs" => {
                    for attr in block.body.attributes() {
                        file.inputs.insert(attr.key.as_str().to_string(), attr.expr.clone());
                    }
                }
                "environment_variables" => {
                    let vars = parse_environment(&file.path, &block.body)?;
                    file.environment.extend(vars);
                }
                other => {
                    tracing::warn!(
                        file = %file.path.display(),
                        block = other,
                        "Ignoring unrecognized block"
                    );
                }
            }
        }

        Ok(file)
    }
}

fn parse_module(path: &Path, block: &Block) -> Result<ModuleBlock> {
    let source = required_string(path, block, "module", "source")?;
    let version = optional_string(path, block, "version")?;
    Ok(ModuleBlock { source, version })
}

fn parse_dependency(path: &Path, block: &Block) -> Result<Dependency> {
    let name = block_label(path, block, "dependency")?;
    let source = required_string(path, block, "dependency", "source")?;
    let separate_environment = optional_bool(path, block, "separate_environment")?.unwrap_or(false);

    let mut environment = IndexMap::new();
    for inner in block.body.blocks() {
        if inner.identifier.as_str() == "environment_variables" {
            environment.extend(parse_environment(path, &inner.body)?);
        }
    }

    Ok(Dependency {
        name,
        source,
        separate_environment,
        environment,
        declared_in: path.to_path_buf(),
    })
}

fn parse_hook(path: &Path, block: &Block) -> Result<Hook> {
    let name = block_label(path, block, "hook")?;
    let command = optional_string(path, block, "command")?;
    let script = optional_string(path, block, "script")?;
    let trigger_on = optional_string(path, block, "trigger_on")?;
    let args = optional_string_list(path, block, "args")?.unwrap_or_default();

    Ok(Hook {
        name,
        command,
        script,
        trigger_on,
        args,
    })
}

fn parse_environment(path: &Path, body: &Body) -> Result<IndexMap<String, String>> {
    let mut vars = IndexMap::new();
    for attr in body.attributes() {
        let value = eval(path, attr.key.as_str(), &attr.expr)?;
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => {
                return Err(Error::InvalidValue {
                    path: path.to_path_buf(),
                    attribute: attr.key.as_str().to_string(),
                    message: "environment variables must be strings, numbers or booleans"
                        .to_string(),
                });
            }
        };
        vars.insert(attr.key.as_str().to_string(), text);
    }
    Ok(vars)
}

fn block_label(path: &Path, block: &Block, kind: &str) -> Result<String> {
    block
        .labels
        .first()
        .map(|l| l.as_str().to_string())
        .ok_or_else(|| Error::MissingAttribute {
            path: path.to_path_buf(),
            block: kind.to_string(),
            attribute: "name label".to_string(),
        })
}

fn attribute<'a>(block: &'a Block, key: &str) -> Option<&'a Expression> {
    block
        .body
        .attributes()
        .find(|a| a.key.as_str() == key)
        .map(|a| &a.expr)
}

/// Evaluate an expression with no variables in scope
///
/// Only `inputs` may reference variables; everything else must be a
/// constant expression.
fn eval(path: &Path, key: &str, expr: &Expression) -> Result<Value> {
    expr.evaluate(&Context::new())
        .map_err(|e| Error::InvalidValue {
            path: path.to_path_buf(),
            attribute: key.to_string(),
            message: e.to_string(),
        })
}

fn required_string(path: &Path, block: &Block, kind: &str, key: &str) -> Result<String> {
    optional_string(path, block, key)?.ok_or_else(|| Error::MissingAttribute {
        path: path.to_path_buf(),
        block: kind.to_string(),
        attribute: key.to_string(),
    })
}

fn optional_string(path: &Path, block: &Block, key: &str) -> Result<Option<String>> {
    let Some(expr) = attribute(block, key) else {
        return Ok(None);
    };
    match eval(path, key, expr)? {
        Value::String(s) => Ok(Some(s)),
        _ => Err(Error::InvalidValue {
            path: path.to_path_buf(),
            attribute: key.to_string(),
            message: "expected a string".to_string(),
        }),
    }
}

fn optional_bool(path: &Path, block: &Block, key: &str) -> Result<Option<bool>> {
    let Some(expr) = attribute(block, key) else {
        return Ok(None);
    };
    match eval(path, key, expr)? {
        Value::Bool(b) => Ok(Some(b)),
        _ => Err(Error::InvalidValue {
            path: path.to_path_buf(),
            attribute: key.to_string(),
            message: "expected a boolean".to_string(),
        }),
    }
}

fn optional_string_list(path: &Path, block: &Block, key: &str) -> Result<Option<Vec<String>>> {
    let Some(expr) = attribute(block, key) else {
        return Ok(None);
    };
    match eval(path, key, expr)? {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(Error::InvalidValue {
                    path: path.to_path_buf(),
                    attribute: key.to_string(),
                    message: "expected a list of strings".to_string(),
                }),
            })
            .collect::<Result<Vec<_>>>()
            .map(Some),
        _ => Err(Error::InvalidValue {
            path: path.to_path_buf(),
            attribute: key.to_string(),
            message: "expected a list of strings".to_string(),
        }),
    }
}
