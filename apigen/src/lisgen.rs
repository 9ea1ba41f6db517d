//! Listener/recorder variant.
//!
//! For every class flagged `listenable`, emits a two-tier hook surface: a
//! `<Class>Listener` interface where every hook is an overridable no-op, and
//! a `<Class>Recorder` that overrides every hook — its own and the ones
//! collected up the parent chain — to print the invoked operation's name.
//! Recorders also carry one best-effort `cloneInto` per listenable class,
//! attaching a fresh recorder to a handle and reporting success with a bool.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::cppgen::{Style, banner, include_line, parm_list};
use crate::model::{ApiDescription, ClassDesc};
use crate::naming;
use crate::output::Artifact;
use crate::types::TypeMap;

pub struct ListenerGenerator<'a> {
    model: &'a ApiDescription,
    types: &'a TypeMap<'a>,
}

impl<'a> ListenerGenerator<'a> {
    pub fn new(model: &'a ApiDescription, types: &'a TypeMap<'a>) -> Self {
        ListenerGenerator { model, types }
    }

    /// Generate the listener and recorder artifacts for every listenable
    /// class: listener header, recorder header, recorder source.
    pub fn generate(&self, header_dir: &Path, source_dir: &Path) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for class in self.model.listenable_classes() {
            artifacts.push(Artifact::new(
                header_dir.join(format!("{}.hpp", naming::listener_class(class))),
                self.listener_header(class)?,
            ));
            artifacts.push(Artifact::new(
                header_dir.join(format!("{}.hpp", naming::recorder_class(class))),
                self.recorder_header(class)?,
            ));
            artifacts.push(Artifact::new(
                source_dir.join(format!("{}.cpp", naming::recorder_class(class))),
                self.recorder_source(class)?,
            ));
            debug!(class = %class.name, "generated listener/recorder pair");
        }
        Ok(artifacts)
    }

    /// The listener's parent listener, when the class's own parent is also
    /// instrumentable.
    fn parent_listener(&self, class: &ClassDesc) -> Option<&ClassDesc> {
        self.model.parent_of(class).filter(|p| p.is_listenable())
    }

    // -----------------------------------------------------------------------
    // Listener
    // -----------------------------------------------------------------------

    fn listener_header(&self, class: &ClassDesc) -> Result<String> {
        let listener = naming::listener_class(class);
        let mut out = banner(&self.model.project);
        let guard = naming::include_guard(&listener);
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));

        if let Some(parent) = self.parent_listener(class) {
            out.push_str(&include_line(&format!(
                "{}.hpp",
                naming::listener_class(parent)
            )));
            out.push('\n');
        }

        self.open_namespaces(&mut out);
        self.forward_declarations(&mut out);

        match self.parent_listener(class) {
            Some(parent) => out.push_str(&format!(
                "class {listener} : public {} {{\n",
                naming::listener_class(parent)
            )),
            None => out.push_str(&format!("class {listener} {{\n")),
        }
        out.push_str("public:\n");

        for hook in self
            .model
            .declared_services(class)
            .into_iter()
            .chain(class.callbacks.iter())
        {
            out.push_str(&format!(
                "virtual void {}({}) {{}}\n",
                hook.name,
                parm_list(self.types, &hook.parms, Style::Cpp)?
            ));
        }
        out.push('\n');

        // cloneInto registers a fresh listener on the given handle; the
        // default attaches nothing and says so.
        for target in self.model.listenable_classes() {
            out.push_str(&format!(
                "virtual bool cloneInto({} * b) {{ return false; }}\n",
                naming::qualified_class(target)
            ));
        }
        out.push('\n');

        // The mute hint lets one event suppress the flood of secondary
        // events it triggers; the event-emission layer checks it.
        out.push_str("void muteHint() { _muteHint = true; }\n");
        out.push_str("void unmuteHint() { _muteHint = false; }\n");
        out.push_str("bool isMuteHintSet() { return _muteHint; }\n");
        out.push('\n');
        out.push_str("private:\nbool _muteHint = false;\n");
        out.push_str("};\n\n");

        self.close_namespaces(&mut out);
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Recorder
    // -----------------------------------------------------------------------

    fn recorder_header(&self, class: &ClassDesc) -> Result<String> {
        let recorder = naming::recorder_class(class);
        let mut out = banner(&self.model.project);
        let guard = naming::include_guard(&recorder);
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        out.push_str(&include_line(&format!(
            "{}.hpp",
            naming::listener_class(class)
        )));
        out.push('\n');

        self.open_namespaces(&mut out);
        self.forward_declarations(&mut out);

        out.push_str(&format!(
            "class {recorder} : public {} {{\n",
            naming::listener_class(class)
        ));
        out.push_str("public:\n");

        for hook in self.model.recorder_hooks(class) {
            out.push_str(&format!(
                "virtual void {}({});\n",
                hook.name,
                parm_list(self.types, &hook.parms, Style::Cpp)?
            ));
        }
        out.push('\n');
        for target in self.model.listenable_classes() {
            out.push_str(&format!(
                "virtual bool cloneInto({} * b);\n",
                naming::qualified_class(target)
            ));
        }
        out.push_str("};\n\n");

        self.close_namespaces(&mut out);
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    fn recorder_source(&self, class: &ClassDesc) -> Result<String> {
        let recorder = naming::recorder_class(class);
        let mut out = banner(&self.model.project);

        for c in self.model.top_level_classes() {
            out.push_str(&include_line(&format!("{}.hpp", c.name)));
        }
        for target in self.model.listenable_classes() {
            out.push_str(&include_line(&format!(
                "{}.hpp",
                naming::recorder_class(target)
            )));
        }
        out.push_str("#include <iostream>\n\n");

        self.open_namespaces(&mut out);

        for hook in self.model.recorder_hooks(class) {
            out.push_str(&format!(
                "void {recorder}::{}({}) {{ std::cout << \"{}\\n\"; }}\n",
                hook.name,
                parm_list(self.types, &hook.parms, Style::Cpp)?,
                hook.name
            ));
        }
        out.push('\n');

        // Best-effort attachment: construct a recorder for the target type
        // and hand it over; success is unconditional once we get this far.
        for target in self.model.listenable_classes() {
            out.push_str(&format!(
                "bool {recorder}::cloneInto({} * b) {{ \
                 b->RegisterListener(new {}()); return true; }}\n",
                naming::qualified_class(target),
                naming::recorder_class(target)
            ));
        }
        out.push('\n');

        self.close_namespaces(&mut out);
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Small pieces
    // -----------------------------------------------------------------------

    fn open_namespaces(&self, out: &mut String) {
        for ns in &self.model.namespaces {
            out.push_str(&format!("namespace {ns} {{\n"));
        }
        out.push('\n');
    }

    /// Nested classes are flattened to siblings here, so every class can be
    /// forward declared at namespace scope.
    fn forward_declarations(&self, out: &mut String) {
        out.push_str("// forward declarations for all API classes\n");
        for class in self.model.all_classes() {
            out.push_str(&format!("class {};\n", class.name));
        }
        out.push('\n');
    }

    fn close_namespaces(&self, out: &mut String) {
        for ns in self.model.namespaces.iter().rev() {
            out.push_str(&format!("}} // namespace {ns}\n"));
        }
        out.push('\n');
    }
}
