//! Dependency graph resolver
//!
//! Discovers the dependency graph rooted at one module declaration,
//! orders it, and drives the processor per node. Traversal uses an
//! explicit work stack of enter/exit frames instead of recursion, with
//! an active-path set for cycle detection and a depth bound enforced at
//! node entry. A node is processed only after every one of its own
//! dependencies has resolved; each resolved dependency's outputs are
//! exposed to the parent's input expressions as
//! `dependency.<name>.<output>` before the parent is provisioned.

use crate::error::{Error, Result};
use crate::processor::{ModuleProcessor, PreparedModule, Processed};
use hcl::eval::{Context, Evaluate};
use hcl::{Identifier, Value};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use strato_config::{Dependency, LifecycleCommand, Loader, ModuleConfig};
use strato_core::ExecutionEnvironment;

/// Directory under the root module holding all generated working dirs
const CACHE_DIR: &str = ".strato";

/// Subdirectory of a module's working dir holding its dependencies
const DEPS_DIR: &str = "deps";

/// One discovered module in the graph
struct Node {
    config: ModuleConfig,
    env: ExecutionEnvironment,
    depth: usize,
    parent: Option<usize>,
    /// Edge that led here; `None` for the root
    dep: Option<Dependency>,
    children: Vec<usize>,
    outputs: IndexMap<String, Value>,
}

impl Node {
    fn name(&self) -> &str {
        self.dep.as_ref().map_or_else(|| self.config.name(), |d| d.name.as_str())
    }
}

enum Frame {
    Enter(usize),
    Exit(usize),
}

/// Resolves and provisions a dependency graph
pub struct Resolver<'a, P: ModuleProcessor> {
    processor: &'a P,
    loader: Loader,
    command: LifecycleCommand,
    max_depth: usize,
}

impl<'a, P: ModuleProcessor> Resolver<'a, P> {
    /// Create a resolver driving the given processor
    pub fn new(processor: &'a P, command: LifecycleCommand, max_depth: usize) -> Self {
        Self {
            processor,
            loader: Loader::new(),
            command,
            max_depth,
        }
    }

    /// Resolve the graph rooted at `root` and provision it
    ///
    /// Dependencies are provisioned innermost-first; the root's own
    /// lifecycle command runs last and is the externally visible
    /// outcome of the whole run.
    pub fn resolve(&self, root: &Path) -> Result<()> {
        let config = self.loader.load(root)?;
        let work_dir = config.dir().join(CACHE_DIR).join(config.name());
        let mut env = ExecutionEnvironment::new(work_dir);
        env.extend(&config.environment);

        let mut nodes = vec![Node {
            config,
            env,
            depth: 0,
            parent: None,
            dep: None,
            children: Vec::new(),
            outputs: IndexMap::new(),
        }];
        let mut stack = vec![Frame::Enter(0)];
        let mut active: HashSet<PathBuf> = HashSet::new();

        while let Some(frame) = stack.pop() {
            match frame {
                Frame::Enter(id) => self.enter(&mut nodes, &mut stack, &mut active, id)?,
                Frame::Exit(id) => self.exit(&mut nodes, &mut active, id)?,
            }
        }

        Ok(())
    }

    /// Check graph bounds for a node and discover its children
    fn enter(
        &self,
        nodes: &mut Vec<Node>,
        stack: &mut Vec<Frame>,
        active: &mut HashSet<PathBuf>,
        id: usize,
    ) -> Result<()> {
        if nodes[id].depth > self.max_depth {
            return Err(Error::MaxDepthExceeded {
                chain: chain(nodes, id),
                max_depth: self.max_depth,
            });
        }
        if !active.insert(nodes[id].config.path.clone()) {
            return Err(Error::CyclicDependency {
                chain: chain(nodes, id),
            });
        }

        stack.push(Frame::Exit(id));

        let deps = nodes[id].config.dependencies.clone();
        let mut child_ids = Vec::with_capacity(deps.len());
        for dep in deps {
            let child_config = self.loader.load(&dep.source_path())?;
            let child_dir = nodes[id].env.working_dir().join(DEPS_DIR).join(&dep.name);
            let mut child_env = nodes[id].env.branch(child_dir);
            if dep.separate_environment {
                // The dependency's process environment is exactly its
                // declared variables, nothing inherited.
                child_env = child_env.isolated();
                child_env.extend(&child_config.environment);
                child_env.extend(&dep.environment);
            }

            let child_id = nodes.len();
            nodes.push(Node {
                config: child_config,
                env: child_env,
                depth: nodes[id].depth + 1,
                parent: Some(id),
                dep: Some(dep),
                children: Vec::new(),
                outputs: IndexMap::new(),
            });
            child_ids.push(child_id);
        }

        nodes[id].children.clone_from(&child_ids);
        // Reverse push so the first declared dependency resolves first.
        for child_id in child_ids.into_iter().rev() {
            stack.push(Frame::Enter(child_id));
        }

        Ok(())
    }

    /// Provision a node whose children have all resolved
    fn exit(
        &self,
        nodes: &mut [Node],
        active: &mut HashSet<PathBuf>,
        id: usize,
    ) -> Result<()> {
        active.remove(&nodes[id].config.path);

        let inputs = evaluate_inputs(nodes, id);
        let node = &nodes[id];
        let prepared = PreparedModule {
            name: node.name(),
            config: &node.config,
            env: &node.env,
            inputs: &inputs,
            command: self.command,
            separate_environment: node.dep.as_ref().is_some_and(|d| d.separate_environment),
        };

        if node.parent.is_none() {
            tracing::info!(module = prepared.name, "Provisioning root module");
            self.processor.finish(&prepared)
        } else {
            tracing::info!(module = prepared.name, depth = node.depth, "Processing dependency");
            let outputs = match self.processor.process(&prepared)? {
                Processed::Resolved(outputs) => outputs,
                Processed::NotYetAvailable => IndexMap::new(),
            };
            nodes[id].outputs = outputs;
            Ok(())
        }
    }
}

/// Evaluate a node's input expressions against its children's outputs
///
/// An expression that fails to evaluate (typically because it references
/// an output of an unresolved dependency) fails only that input: it is
/// logged and skipped, never fatal.
fn evaluate_inputs(nodes: &[Node], id: usize) -> IndexMap<String, Value> {
    let node = &nodes[id];

    let mut dependencies = hcl::value::Map::new();
    for &child_id in &node.children {
        let child = &nodes[child_id];
        let outputs = child.outputs.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        dependencies.insert(child.name().to_string(), Value::Object(outputs));
    }

    let mut ctx = Context::new();
    ctx.declare_var(Identifier::sanitized("dependency"), Value::Object(dependencies));

    let mut inputs = IndexMap::with_capacity(node.config.inputs.len());
    for (name, expr) in &node.config.inputs {
        match expr.evaluate(&ctx) {
            Ok(value) => {
                inputs.insert(name.clone(), value);
            }
            Err(e) => {
                tracing::warn!(
                    module = node.name(),
                    input = %name,
                    error = %e,
                    "Skipping input that failed to evaluate"
                );
            }
        }
    }
    inputs
}

/// Human-readable path from the root to a node, for graph errors
fn chain(nodes: &[Node], id: usize) -> String {
    let mut names = Vec::new();
    let mut current = Some(id);
    while let Some(i) = current {
        names.push(nodes[i].name().to_string());
        current = nodes[i].parent;
    }
    names.reverse();
    names.join(" -> ")
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    /// Records every processor interaction instead of provisioning
    #[derive(Default)]
    struct FakeProcessor {
        /// Outputs returned per dependency name
        outputs: HashMap<String, IndexMap<String, Value>>,
        /// Dependencies that report "not yet available"
        soft: HashSet<String>,
        processed: RefCell<Vec<String>>,
        inputs_seen: RefCell<HashMap<String, IndexMap<String, Value>>>,
        envs_seen: RefCell<HashMap<String, IndexMap<String, String>>>,
        isolated_seen: RefCell<HashMap<String, bool>>,
        dirs_seen: RefCell<HashMap<String, PathBuf>>,
        finished: RefCell<Option<(String, IndexMap<String, Value>)>>,
    }

    impl FakeProcessor {
        fn with_outputs(name: &str, outputs: &[(&str, &str)]) -> Self {
            let mut fake = Self::default();
            fake.add_outputs(name, outputs);
            fake
        }

        fn add_outputs(&mut self, name: &str, outputs: &[(&str, &str)]) {
            let map = outputs
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::from(*v)))
                .collect();
            self.outputs.insert(name.to_string(), map);
        }
    }

    impl ModuleProcessor for FakeProcessor {
        fn process(&self, module: &PreparedModule<'_>) -> Result<Processed> {
            self.processed.borrow_mut().push(module.name.to_string());
            self.inputs_seen
                .borrow_mut()
                .insert(module.name.to_string(), module.inputs.clone());
            self.envs_seen
                .borrow_mut()
                .insert(module.name.to_string(), module.env.vars().clone());
            self.isolated_seen
                .borrow_mut()
                .insert(module.name.to_string(), module.env.is_isolated());
            self.dirs_seen
                .borrow_mut()
                .insert(module.name.to_string(), module.env.working_dir().to_path_buf());

            if self.soft.contains(module.name) {
                return Ok(Processed::NotYetAvailable);
            }
            Ok(Processed::Resolved(
                self.outputs.get(module.name).cloned().unwrap_or_default(),
            ))
        }

        fn finish(&self, module: &PreparedModule<'_>) -> Result<()> {
            *self.finished.borrow_mut() =
                Some((module.name.to_string(), module.inputs.clone()));
            Ok(())
        }
    }

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn resolve(fake: &FakeProcessor, root: &Path, max_depth: usize) -> Result<()> {
        Resolver::new(fake, LifecycleCommand::Apply, max_depth).resolve(root)
    }

    #[test]
    fn test_single_dependency_feeds_root_inputs() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "dep.hcl", "module {\n  source = \"./modules/dep\"\n}");
        let root = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./modules/app\"\n}\n\
             dependency \"dep\" {\n  source = \"./dep.hcl\"\n}\n\
             inputs {\n  dep_ip = dependency.dep.ip\n}",
        );

        let fake = FakeProcessor::with_outputs("dep", &[("ip", "10.0.0.1")]);
        resolve(&fake, &root, 2).unwrap();

        assert_eq!(*fake.processed.borrow(), vec!["dep"]);
        let (name, inputs) = fake.finished.borrow().clone().unwrap();
        assert_eq!(name, "app");
        assert_eq!(inputs.get("dep_ip").unwrap(), &Value::from("10.0.0.1"));
    }

    #[test]
    fn test_children_resolve_before_parents() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "y.hcl", "module {\n  source = \"./modules/y\"\n}");
        write(
            tmp.path(),
            "x.hcl",
            "module {\n  source = \"./modules/x\"\n}\n\
             dependency \"y\" {\n  source = \"./y.hcl\"\n}\n\
             inputs {\n  net = dependency.y.cidr\n}",
        );
        let root = write(
            tmp.path(),
            "root.hcl",
            "module {\n  source = \"./modules/root\"\n}\n\
             dependency \"x\" {\n  source = \"./x.hcl\"\n}",
        );

        let mut fake = FakeProcessor::with_outputs("y", &[("cidr", "10.0.0.0/8")]);
        fake.add_outputs("x", &[("ip", "10.0.0.2")]);
        resolve(&fake, &root, 2).unwrap();

        assert_eq!(*fake.processed.borrow(), vec!["y", "x"]);
        let inputs = fake.inputs_seen.borrow().get("x").cloned().unwrap();
        assert_eq!(inputs.get("net").unwrap(), &Value::from("10.0.0.0/8"));
    }

    #[test]
    fn test_max_depth_exceeded_names_chain() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "y.hcl", "module {\n  source = \"./modules/y\"\n}");
        write(
            tmp.path(),
            "x.hcl",
            "module {\n  source = \"./modules/x\"\n}\n\
             dependency \"y\" {\n  source = \"./y.hcl\"\n}",
        );
        let root = write(
            tmp.path(),
            "root.hcl",
            "module {\n  source = \"./modules/root\"\n}\n\
             dependency \"x\" {\n  source = \"./x.hcl\"\n}",
        );

        let fake = FakeProcessor::default();
        let err = resolve(&fake, &root, 1).unwrap_err();
        match err {
            Error::MaxDepthExceeded { chain, max_depth } => {
                assert_eq!(max_depth, 1);
                assert_eq!(chain, "root -> x -> y");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.processed.borrow().is_empty());

        // The same chain fits when the bound covers its depth.
        resolve(&fake, &root, 2).unwrap();
    }

    #[test]
    fn test_cycle_detected_without_processing() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "b.hcl",
            "module {\n  source = \"./modules/b\"\n}\n\
             dependency \"a\" {\n  source = \"./a.hcl\"\n}",
        );
        let root = write(
            tmp.path(),
            "a.hcl",
            "module {\n  source = \"./modules/a\"\n}\n\
             dependency \"b\" {\n  source = \"./b.hcl\"\n}",
        );

        let fake = FakeProcessor::default();
        let err = resolve(&fake, &root, 10).unwrap_err();
        match err {
            Error::CyclicDependency { chain } => assert_eq!(chain, "a -> b -> a"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(fake.processed.borrow().is_empty());
    }

    #[test]
    fn test_soft_failure_leaves_outputs_absent() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "dep.hcl", "module {\n  source = \"./modules/dep\"\n}");
        let root = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./modules/app\"\n}\n\
             dependency \"dep\" {\n  source = \"./dep.hcl\"\n}\n\
             inputs {\n  dep_ip = dependency.dep.ip\n  region = \"east\"\n}",
        );

        let mut fake = FakeProcessor::default();
        fake.soft.insert("dep".to_string());
        resolve(&fake, &root, 2).unwrap();

        // The unresolvable input is skipped; literals still evaluate.
        let (_, inputs) = fake.finished.borrow().clone().unwrap();
        assert!(inputs.get("dep_ip").is_none());
        assert_eq!(inputs.get("region").unwrap(), &Value::from("east"));
    }

    #[test]
    fn test_separate_environment_gets_dependency_vars() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "dep.hcl",
            "module {\n  source = \"./modules/dep\"\n}\n\
             environment_variables {\n  REGION = \"west\"\n}",
        );
        let root = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./modules/app\"\n}\n\
             environment_variables {\n  REGION = \"east\"\n}\n\
             dependency \"dep\" {\n  source = \"./dep.hcl\"\n  separate_environment = true\n}",
        );

        let fake = FakeProcessor::default();
        resolve(&fake, &root, 2).unwrap();

        let env = fake.envs_seen.borrow().get("dep").cloned().unwrap();
        assert_eq!(env.get("REGION").unwrap(), "west");
        assert!(fake.isolated_seen.borrow()["dep"]);
    }

    #[test]
    fn test_inherited_environment_is_untouched() {
        let tmp = tempfile::tempdir().unwrap();
        write(
            tmp.path(),
            "dep.hcl",
            "module {\n  source = \"./modules/dep\"\n}\n\
             environment_variables {\n  REGION = \"west\"\n}",
        );
        let root = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./modules/app\"\n}\n\
             environment_variables {\n  REGION = \"east\"\n}\n\
             dependency \"dep\" {\n  source = \"./dep.hcl\"\n}",
        );

        let fake = FakeProcessor::default();
        resolve(&fake, &root, 2).unwrap();

        let env = fake.envs_seen.borrow().get("dep").cloned().unwrap();
        assert_eq!(env.get("REGION").unwrap(), "east");
        assert!(!fake.isolated_seen.borrow()["dep"]);
    }

    #[test]
    fn test_dependency_working_dirs_nest_under_cache() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "dep.hcl", "module {\n  source = \"./modules/dep\"\n}");
        let root = write(
            tmp.path(),
            "app.hcl",
            "module {\n  source = \"./modules/app\"\n}\n\
             dependency \"first\" {\n  source = \"./dep.hcl\"\n}",
        );

        let fake = FakeProcessor::default();
        resolve(&fake, &root, 2).unwrap();

        let dir = fake.dirs_seen.borrow().get("first").cloned().unwrap();
        let canonical = tmp.path().canonicalize().unwrap();
        assert_eq!(dir, canonical.join(".strato").join("app").join("deps").join("first"));
    }
}
