//! C++ client generator.
//!
//! Emits one header/source pair per top-level class (nested classes are
//! emitted truly nested, inside their enclosing class), plus an aggregate
//! pair for the free-standing services. Shared body-building helpers live
//! here and are reused by the C variant, which differs in surface syntax
//! but not in boundary-conversion rules.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::model::{ApiDescription, ClassDesc};
use crate::naming;
use crate::output::Artifact;
use crate::schema::{ConstructorDecl, ParameterDecl, ServiceDecl};
use crate::types::TypeMap;

/// Which client surface a shared helper is emitting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Style {
    Cpp,
    C,
}

pub struct CppGenerator<'a> {
    model: &'a ApiDescription,
    types: &'a TypeMap<'a>,
}

impl<'a> CppGenerator<'a> {
    pub fn new(model: &'a ApiDescription, types: &'a TypeMap<'a>) -> Self {
        CppGenerator { model, types }
    }

    /// Generate every C++ client artifact: a header/source pair per
    /// top-level class and the aggregate project pair.
    pub fn generate(&self, header_dir: &Path, source_dir: &Path) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for class in self.model.top_level_classes() {
            artifacts.push(Artifact::new(
                header_dir.join(format!("{}.hpp", class.name)),
                self.class_header(class)?,
            ));
            artifacts.push(Artifact::new(
                source_dir.join(format!("{}.cpp", class.name)),
                self.class_source(class)?,
            ));
            debug!(class = %class.name, "generated C++ client class");
        }
        artifacts.push(Artifact::new(
            header_dir.join(format!("{}.hpp", self.model.project)),
            self.common_header()?,
        ));
        artifacts.push(Artifact::new(
            source_dir.join(format!("{}.cpp", self.model.project)),
            self.common_source()?,
        ));
        Ok(artifacts)
    }

    // -----------------------------------------------------------------------
    // Headers
    // -----------------------------------------------------------------------

    fn class_header(&self, class: &ClassDesc) -> Result<String> {
        let mut out = banner(&self.model.project);
        let guard = naming::include_guard(&class.name);
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));

        if let Some(parent) = self.model.parent_of(class) {
            out.push_str(&include_line(&format!("{}.hpp", parent.name)));
        }
        if class.has_extras_header() {
            out.push_str(&include_line(&format!("{}ExtrasOutsideClass.hpp", class.name)));
        }
        out.push('\n');

        self.open_namespaces(&mut out);
        self.forward_declarations(&mut out);

        self.class_decl(class, &mut out)?;
        out.push('\n');
        self.allocator_decls(class, &mut out);
        out.push('\n');

        self.close_namespaces(&mut out);
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    /// The class declaration itself, nested classes first, then members in
    /// the fixed order: fields, impl slot, constructors, impl constructor,
    /// initialize hook, destructor, callbacks, services.
    fn class_decl(&self, class: &ClassDesc, out: &mut String) -> Result<()> {
        match self.model.parent_of(class) {
            Some(parent) => out.push_str(&format!(
                "class {} : public {} {{\n",
                class.name,
                naming::qualified_class(parent)
            )),
            None => out.push_str(&format!("class {} {{\n", class.name)),
        }

        for nested in self.model.nested_classes(class) {
            out.push_str("public:\n");
            self.class_decl(nested, out)?;
        }

        for field in &class.fields {
            out.push_str(&format!(
                "public: {} {};\n",
                self.types.client_type(&field.ty)?,
                field.name
            ));
        }

        if !class.has_parent() {
            out.push_str("public: void * _impl;\n");
        }

        for ctor in &class.constructors {
            out.push_str(&format!(
                "{}: {}({});\n",
                ctor.visibility(),
                class.name,
                self.parm_list(&ctor.parms)?
            ));
        }
        out.push_str(&format!("public: {}(void * impl);\n", class.name));
        out.push_str("public: void initializeFromImpl(void * impl);\n");
        out.push_str(&format!("public: ~{}();\n", class.name));

        for callback in &class.callbacks {
            out.push_str(&format!(
                "{}: virtual {} {}({});\n",
                callback.visibility(),
                self.types.client_type(&callback.return_type)?,
                callback.name,
                self.parm_list(&callback.parms)?
            ));
        }

        for service in self.model.declared_services(class) {
            out.push_str(&self.service_decl(service)?);
        }

        if class.has_extras_header() {
            out.push_str(&include_line(&format!("{}ExtrasInsideClass.hpp", class.name)));
        }
        out.push_str("};\n");
        Ok(())
    }

    /// Allocator declarations for a class and everything nested under it;
    /// allocator-registration bodies in other translation units call these.
    fn allocator_decls(&self, class: &ClassDesc, out: &mut String) {
        out.push_str(&format!(
            "extern \"C\" void * {}(void * impl);\n",
            naming::allocator(class)
        ));
        for nested in self.model.nested_classes(class) {
            self.allocator_decls(nested, out);
        }
    }

    fn service_decl(&self, service: &ServiceDecl) -> Result<String> {
        let qualifier = if service.is_static() { "static " } else { "" };
        let ret = self.types.client_type(&service.return_type)?;
        let mut decl = format!(
            "{}: {}{} {}({});\n",
            service.visibility(),
            qualifier,
            ret,
            service.overload_name(),
            self.parm_list(&service.parms)?
        );
        if service.is_vararg() {
            decl.push_str(&format!(
                "{}: {}{} {}({});\n",
                service.visibility(),
                qualifier,
                ret,
                service.overload_name(),
                self.vararg_parm_list(&service.parms)?
            ));
        }
        Ok(decl)
    }

    // -----------------------------------------------------------------------
    // Sources
    // -----------------------------------------------------------------------

    fn class_source(&self, class: &ClassDesc) -> Result<String> {
        let mut out = banner(&self.model.project);
        out.push_str("#include <cstddef>\n");
        if class_tree_has_vararg(self.model, class) {
            out.push_str("#include <cstdarg>\n");
        }
        // Include every client header rather than working out the minimal
        // set; generated sources are not edited, only compiled.
        for c in self.model.top_level_classes() {
            out.push_str(&include_line(&format!("{}.hpp", c.name)));
        }
        out.push_str(&include_line("Callbacks.hpp"));
        out.push_str(&include_line("Macros.hpp"));
        out.push('\n');

        self.open_namespaces(&mut out);
        self.class_defs(class, &mut out)?;
        self.close_namespaces(&mut out);
        Ok(out)
    }

    /// All definitions for a class and, recursively, its nested classes.
    fn class_defs(&self, class: &ClassDesc, out: &mut String) -> Result<()> {
        for callback in &class.callbacks {
            out.push_str(&self.callback_thunk_def(class, callback)?);
            out.push('\n');
        }

        for ctor in &class.constructors {
            out.push_str(&self.constructor_def(class, ctor)?);
            out.push('\n');
        }
        out.push_str(&self.impl_constructor_def(class));
        out.push('\n');
        out.push_str(&self.initializer_def(class)?);
        out.push('\n');
        out.push_str(&format!(
            "{}::~{}() {{}}\n\n",
            naming::qualified_class(class),
            class.name
        ));

        for callback in &class.callbacks {
            out.push_str(&self.callback_default_def(class, callback)?);
            out.push('\n');
        }

        for service in self.model.declared_services(class) {
            out.push_str(&self.service_def(class, service)?);
            out.push('\n');
            if service.is_vararg() {
                out.push_str(&self.vararg_def(class, service)?);
                out.push('\n');
            }
        }

        out.push_str(&self.allocator_def(class));
        out.push('\n');

        for nested in self.model.nested_classes(class) {
            self.class_defs(nested, out)?;
        }
        Ok(())
    }

    /// `extern "C"` thunk the implementation calls to reach a
    /// client-overridden callback: reconstitute the handle, forward.
    fn callback_thunk_def(&self, class: &ClassDesc, callback: &ServiceDecl) -> Result<String> {
        let qualified = naming::qualified_class(class);
        let ret = self.types.client_type(&callback.return_type)?;
        let parms = self.parm_list(&callback.parms)?;
        let lead = if parms.is_empty() { String::new() } else { format!(", {parms}") };
        let args: Vec<&str> = callback.parms.iter().map(|p| p.name.as_str()).collect();
        let forward = format!("client->{}({})", callback.name, args.join(", "));

        let mut out = format!(
            "extern \"C\" {} {}(void * clientObj{}) {{\n",
            ret,
            naming::callback_thunk(class, callback),
            lead
        );
        out.push_str(&format!(
            "    {qualified} * client = reinterpret_cast<{qualified} *>(clientObj);\n"
        ));
        if callback.return_type == "none" {
            out.push_str(&format!("    {forward};\n"));
        } else {
            out.push_str(&format!("    return {forward};\n"));
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Allocating constructor: build the implementation object from the
    /// converted arguments, associate it both ways, then hydrate.
    fn constructor_def(&self, class: &ClassDesc, ctor: &ConstructorDecl) -> Result<String> {
        let qualified = naming::qualified_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);

        let mut out = format!(
            "{}::{}({}) {{\n",
            qualified,
            class.name,
            self.parm_list(&ctor.parms)?
        );
        for parm in &ctor.parms {
            if let Some(line) = arg_setup(self.types, parm)? {
                out.push_str(&format!("    {line}\n"));
            }
        }
        let args = self.call_args(&ctor.parms)?;
        out.push_str(&format!(
            "    {impl_class} * implObj = new {impl_class}({});\n",
            args.join(", ")
        ));
        for parm in &ctor.parms {
            if let Some(line) = arg_teardown(self.types, parm)? {
                out.push_str(&format!("    {line}\n"));
            }
        }
        out.push_str("    implObj->setClient(this);\n");
        out.push_str("    initializeFromImpl(implObj);\n");
        out.push_str("}\n");
        Ok(out)
    }

    /// Adopting constructor: wrap an existing implementation object.
    fn impl_constructor_def(&self, class: &ClassDesc) -> String {
        let qualified = naming::qualified_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);
        format!(
            "{qualified}::{}(void * impl) {{\n    \
             static_cast<{impl_class} *>(impl)->setClient(this);\n    \
             initializeFromImpl(impl);\n}}\n",
            class.name
        )
    }

    /// `initializeFromImpl`: store (or delegate) the handle slot, wire the
    /// callback thunks, hydrate fields from the implementation object.
    fn initializer_def(&self, class: &ClassDesc) -> Result<String> {
        let qualified = naming::qualified_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);

        let mut out = format!("void {qualified}::initializeFromImpl(void * impl) {{\n");
        match self.model.parent_of(class) {
            Some(parent) => out.push_str(&format!(
                "    {}::initializeFromImpl(impl);\n",
                naming::qualified_class(parent)
            )),
            None => out.push_str("    _impl = impl;\n"),
        }

        if !class.callbacks.is_empty() || !class.fields.is_empty() {
            out.push_str(&format!(
                "    {impl_class} * implObj = static_cast<{impl_class} *>(impl);\n"
            ));
        }
        for callback in &class.callbacks {
            out.push_str(&format!(
                "    implObj->{}(reinterpret_cast<void *>(&{}));\n",
                naming::callback_setter(callback),
                naming::callback_thunk(class, callback)
            ));
        }
        for field in &class.fields {
            if self.types.needs_conversion(&field.ty) {
                let base = self.types.bracket_element(&field.ty)?;
                out.push_str(&format!(
                    "    GET_CLIENT_OBJECT(clientObj_{0}, {1}, implObj->{0});\n    \
                     {0} = clientObj_{0};\n",
                    field.name, base
                ));
            } else {
                out.push_str(&format!("    {0} = implObj->{0};\n", field.name));
            }
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Default definition for a callback: forward to the implementation
    /// when it provides one, otherwise a no-op returning a zero value.
    fn callback_default_def(&self, class: &ClassDesc, callback: &ServiceDecl) -> Result<String> {
        let qualified = naming::qualified_class(class);
        if callback.has_impl_default() {
            let impl_class = naming::impl_class(self.types.impl_namespace(), class);
            let target = format!("static_cast<{impl_class} *>(_impl)->{}", callback.name);
            let body = self.member_body(callback, &target, false)?;
            return Ok(format!(
                "{} {}::{}({}) {}",
                self.types.client_type(&callback.return_type)?,
                qualified,
                callback.name,
                self.parm_list(&callback.parms)?,
                body
            ));
        }

        let ret = self.types.client_type(&callback.return_type)?;
        let body = if callback.return_type == "none" {
            "{}\n".to_string()
        } else if self.types.needs_conversion(&callback.return_type) || ret.ends_with('*') {
            "{ return NULL; }\n".to_string()
        } else if callback.return_type == "boolean" {
            "{ return false; }\n".to_string()
        } else {
            "{ return 0; }\n".to_string()
        };
        Ok(format!(
            "{ret} {qualified}::{}({}) {body}",
            callback.name,
            self.parm_list(&callback.parms)?
        ))
    }

    fn service_def(&self, class: &ClassDesc, service: &ServiceDecl) -> Result<String> {
        let qualified = naming::qualified_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);
        let target = if service.is_static() {
            format!("{impl_class}::{}", service.name)
        } else {
            format!("static_cast<{impl_class} *>(_impl)->{}", service.name)
        };
        let body = self.member_body(service, &target, service.sets_allocators())?;
        Ok(format!(
            "{} {}::{}({}) {}",
            self.types.client_type(&service.return_type)?,
            qualified,
            service.overload_name(),
            self.parm_list(&service.parms)?,
            body
        ))
    }

    /// Body shared by services, impl-default callbacks, and the free
    /// services in the aggregate artifact: allocator registration, argument
    /// setup, the delegated call, teardown, return conversion.
    fn member_body(
        &self,
        service: &ServiceDecl,
        target: &str,
        register_allocators: bool,
    ) -> Result<String> {
        service_body(self.model, self.types, Style::Cpp, service, target, register_allocators)
    }

    /// Variadic twin: drain the platform vararg list into a fresh array,
    /// delegate to the array form, release the array.
    fn vararg_def(&self, class: &ClassDesc, service: &ServiceDecl) -> Result<String> {
        let qualified = naming::qualified_class(class);
        let signature = format!(
            "{} {}::{}({})",
            self.types.client_type(&service.return_type)?,
            qualified,
            service.overload_name(),
            self.vararg_parm_list(&service.parms)?
        );
        let delegate = service.overload_name();
        vararg_body(self.types, Style::Cpp, service, &signature, &delegate, None)
    }

    fn allocator_def(&self, class: &ClassDesc) -> String {
        format!(
            "extern \"C\" void * {}(void * impl) {{\n    return new {}(impl);\n}}\n",
            naming::allocator(class),
            naming::qualified_class(class)
        )
    }

    // -----------------------------------------------------------------------
    // Aggregate artifacts for free-standing services
    // -----------------------------------------------------------------------

    fn common_header(&self) -> Result<String> {
        let mut out = banner(&self.model.project);
        let guard = naming::include_guard(&self.model.project);
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        for class in self.model.top_level_classes() {
            out.push_str(&include_line(&format!("{}.hpp", class.name)));
        }
        out.push('\n');

        self.open_namespaces(&mut out);
        for service in self.model.declared_free_services() {
            let ret = self.types.client_type(&service.return_type)?;
            out.push_str(&format!(
                "{} {}({});\n",
                ret,
                service.overload_name(),
                self.parm_list(&service.parms)?
            ));
            if service.is_vararg() {
                out.push_str(&format!(
                    "{} {}({});\n",
                    ret,
                    service.overload_name(),
                    self.vararg_parm_list(&service.parms)?
                ));
            }
        }
        out.push('\n');
        self.close_namespaces(&mut out);
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    fn common_source(&self) -> Result<String> {
        let mut out = banner(&self.model.project);
        out.push_str("#include <cstddef>\n");
        if self.model.services.iter().any(|s| s.is_vararg()) {
            out.push_str("#include <cstdarg>\n");
        }
        out.push_str(&include_line(&format!("{}.hpp", self.model.project)));
        out.push_str(&include_line("Callbacks.hpp"));
        out.push_str(&include_line("Macros.hpp"));
        out.push('\n');

        self.open_namespaces(&mut out);
        for service in self.model.declared_free_services() {
            let target = naming::impl_service(service);
            let body = service_body(
                self.model,
                self.types,
                Style::Cpp,
                service,
                &target,
                service.sets_allocators(),
            )?;
            out.push_str(&format!(
                "{} {}({}) {}",
                self.types.client_type(&service.return_type)?,
                service.overload_name(),
                self.parm_list(&service.parms)?,
                body
            ));
            out.push('\n');
            if service.is_vararg() {
                let signature = format!(
                    "{} {}({})",
                    self.types.client_type(&service.return_type)?,
                    service.overload_name(),
                    self.vararg_parm_list(&service.parms)?
                );
                out.push_str(&vararg_body(
                    self.types,
                    Style::Cpp,
                    service,
                    &signature,
                    &service.overload_name(),
                    None,
                )?);
                out.push('\n');
            }
        }
        self.close_namespaces(&mut out);
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Small pieces
    // -----------------------------------------------------------------------

    fn parm_list(&self, parms: &[ParameterDecl]) -> Result<String> {
        parm_list(self.types, parms, Style::Cpp)
    }

    fn vararg_parm_list(&self, parms: &[ParameterDecl]) -> Result<String> {
        vararg_parm_list(self.types, parms, Style::Cpp)
    }

    fn call_args(&self, parms: &[ParameterDecl]) -> Result<Vec<String>> {
        parms
            .iter()
            .map(|p| call_arg(self.model, self.types, Style::Cpp, p))
            .collect()
    }

    fn open_namespaces(&self, out: &mut String) {
        for ns in &self.model.namespaces {
            out.push_str(&format!("namespace {ns} {{\n"));
        }
        out.push('\n');
    }

    fn forward_declarations(&self, out: &mut String) {
        out.push_str("// forward declarations for all API classes\n");
        for class in self.model.top_level_classes() {
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

// ---------------------------------------------------------------------------
// Helpers shared with the C variant
// ---------------------------------------------------------------------------

pub(crate) fn banner(project: &str) -> String {
    format!(
        "// Generated by apigen from the {project} API description.\n\
         // Do not edit by hand; regenerate instead.\n\n"
    )
}

pub(crate) fn include_line(path: &str) -> String {
    format!("#include \"{path}\"\n")
}

/// `true` if the class or any class nested under it declares a vararg
/// service (their definitions share one source file).
pub(crate) fn class_tree_has_vararg(model: &ApiDescription, class: &ClassDesc) -> bool {
    class.services.iter().any(|s| s.is_vararg())
        || model
            .nested_classes(class)
            .any(|nested| class_tree_has_vararg(model, nested))
}

/// Comma-separated `type name` declarations.
pub(crate) fn parm_list(types: &TypeMap, parms: &[ParameterDecl], style: Style) -> Result<String> {
    let decls: Result<Vec<String>> = parms
        .iter()
        .map(|p| {
            let ty = match style {
                Style::Cpp => types.client_type(&p.ty)?,
                Style::C => types.client_type_flat(&p.ty)?,
            };
            Ok(format!("{ty} {}", p.name))
        })
        .collect();
    Ok(decls?.join(", "))
}

/// Same as [`parm_list`] but with the vararg-eligible parameter replaced by
/// the platform variadic marker.
pub(crate) fn vararg_parm_list(
    types: &TypeMap,
    parms: &[ParameterDecl],
    style: Style,
) -> Result<String> {
    let mut decls = Vec::new();
    for p in parms {
        if p.can_be_vararg() {
            decls.push("...".to_string());
            continue;
        }
        let ty = match style {
            Style::Cpp => types.client_type(&p.ty)?,
            Style::C => types.client_type_flat(&p.ty)?,
        };
        decls.push(format!("{ty} {}", p.name));
    }
    Ok(decls.join(", "))
}

/// Setup line for an in-out or array parameter, `None` otherwise.
pub(crate) fn arg_setup(types: &TypeMap, parm: &ParameterDecl) -> Result<Option<String>> {
    if parm.is_array() {
        let elem = types.bracket_element(&parm.ty)?;
        let len = parm.array_len.as_deref().unwrap_or_default();
        Ok(Some(format!(
            "ARRAY_ARG_SETUP({elem}, {len}, {0}Impl, {0});",
            parm.name
        )))
    } else if parm.is_in_out() {
        let elem = types.bracket_element(&parm.ty)?;
        Ok(Some(format!(
            "ARG_SETUP({elem}, {0}Impl, {0}Arg, {0});",
            parm.name
        )))
    } else {
        Ok(None)
    }
}

/// Teardown twin of [`arg_setup`]; emitted after the delegated call.
pub(crate) fn arg_teardown(types: &TypeMap, parm: &ParameterDecl) -> Result<Option<String>> {
    if parm.is_array() {
        let elem = types.bracket_element(&parm.ty)?;
        let len = parm.array_len.as_deref().unwrap_or_default();
        Ok(Some(format!(
            "ARRAY_ARG_RETURN({elem}, {len}, {0}Impl, {0});",
            parm.name
        )))
    } else if parm.is_in_out() {
        let elem = types.bracket_element(&parm.ty)?;
        Ok(Some(format!("ARG_RETURN({elem}, {0}Impl, {0});", parm.name)))
    } else {
        Ok(None)
    }
}

/// The expression a parameter contributes to the delegated call: the local
/// from its setup line when bracketed, an unwrap of the handle when the
/// type converts, the bare name otherwise.
pub(crate) fn call_arg(
    model: &ApiDescription,
    types: &TypeMap,
    style: Style,
    parm: &ParameterDecl,
) -> Result<String> {
    if parm.is_array() {
        return Ok(format!("{}Impl", parm.name));
    }
    if parm.is_in_out() {
        return Ok(format!("{}Arg", parm.name));
    }
    if types.needs_conversion(&parm.ty) {
        let impl_ty = types.impl_type(&parm.ty)?;
        let handle = match style {
            Style::Cpp => format!("{}->_impl", parm.name),
            Style::C => {
                // The C struct embeds its base chain; the _impl slot lives
                // on the root struct.
                let base = types
                    .handle_base(&parm.ty)
                    .expect("conversion implies a handle type");
                let class = model.class_by_name(&base)?;
                let root = model.base_of(class);
                if root.name == class.name {
                    format!("{}->_impl", parm.name)
                } else {
                    format!(
                        "reinterpret_cast<{} *>({})->_impl",
                        naming::flat_class(root),
                        parm.name
                    )
                }
            }
        };
        return Ok(format!(
            "({0} != NULL ? static_cast<{impl_ty}>({handle}) : NULL)",
            parm.name
        ));
    }
    Ok(parm.name.clone())
}

/// Build a complete member/function body: allocator registration, setup
/// lines in declaration order, the delegated call, teardown lines in the
/// same order, then return conversion.
pub(crate) fn service_body(
    model: &ApiDescription,
    types: &TypeMap,
    style: Style,
    service: &ServiceDecl,
    target: &str,
    register_allocators: bool,
) -> Result<String> {
    let mut out = String::from("{\n");

    if register_allocators {
        for class in model.all_classes() {
            out.push_str(&format!(
                "    {}(reinterpret_cast<void *>(&{}));\n",
                naming::allocator_setter(class),
                naming::allocator(class)
            ));
        }
    }

    for parm in &service.parms {
        if let Some(line) = arg_setup(types, parm)? {
            out.push_str(&format!("    {line}\n"));
        }
    }

    let args: Result<Vec<String>> = service
        .parms
        .iter()
        .map(|p| call_arg(model, types, style, p))
        .collect();
    let call = format!("{target}({})", args?.join(", "));

    if service.return_type == "none" {
        out.push_str(&format!("    {call};\n"));
    } else {
        out.push_str(&format!(
            "    {} implRet = {call};\n",
            types.impl_type(&service.return_type)?
        ));
    }

    for parm in &service.parms {
        if let Some(line) = arg_teardown(types, parm)? {
            out.push_str(&format!("    {line}\n"));
        }
    }

    if service.return_type != "none" {
        if types.needs_conversion(&service.return_type) {
            let base = types.bracket_element(&service.return_type)?;
            let client_name = match style {
                Style::Cpp => base.clone(),
                Style::C => {
                    let class = model.class_by_name(&base)?;
                    naming::flat_class(class)
                }
            };
            out.push_str(&format!(
                "    GET_CLIENT_OBJECT(clientObj, {client_name}, implRet);\n    \
                 return clientObj;\n"
            ));
        } else {
            out.push_str("    return implRet;\n");
        }
    }

    out.push_str("}\n");
    Ok(out)
}

/// Build a variadic adapter body under the given signature: allocate a
/// same-length array, drain the vararg list into it, delegate to the array
/// form, release the array, forward the result.
pub(crate) fn vararg_body(
    types: &TypeMap,
    style: Style,
    service: &ServiceDecl,
    signature: &str,
    delegate: &str,
    self_arg: Option<&str>,
) -> Result<String> {
    // Validated at model construction: the vararg parameter exists, is an
    // array, is last, and binds a length parameter.
    let vararg = service
        .parms
        .iter()
        .find(|p| p.can_be_vararg())
        .expect("vararg service has a vararg-eligible parameter");
    let len = vararg.array_len.as_deref().unwrap_or_default();
    let len_parm = service
        .parms
        .iter()
        .find(|p| p.name == len)
        .expect("array_len binding validated at model construction");
    let len_ty = match style {
        Style::Cpp => types.client_type(&len_parm.ty)?,
        Style::C => types.client_type_flat(&len_parm.ty)?,
    };
    let elem = match style {
        Style::Cpp => types.client_element_type(&vararg.ty)?,
        Style::C => {
            let arr_ty = types.client_type_flat(&vararg.ty)?;
            arr_ty
                .strip_suffix('*')
                .map(|s| s.trim_end().to_string())
                .unwrap_or(arr_ty)
        }
    };
    // va_start needs the last named parameter of the variadic signature.
    let last_named = &service.parms[service.parms.len() - 2].name;

    // `IlValue *` elements make an `IlValue **` local; primitives append
    // a plain pointer.
    let arr_ty = if elem.ends_with('*') {
        format!("{elem}*")
    } else {
        format!("{elem} *")
    };

    let mut out = format!("{signature} {{\n");
    out.push_str(&format!(
        "    {arr_ty} {0} = new {elem}[{len}];\n",
        vararg.name
    ));
    out.push_str("    va_list vararg;\n");
    out.push_str(&format!("    va_start(vararg, {last_named});\n"));
    out.push_str(&format!(
        "    for ({len_ty} i = 0; i < {len}; ++i) {{\n        \
         {0}[i] = va_arg(vararg, {elem});\n    }}\n",
        vararg.name
    ));
    out.push_str("    va_end(vararg);\n");

    let mut args: Vec<&str> = Vec::new();
    if let Some(self_arg) = self_arg {
        args.push(self_arg);
    }
    args.extend(service.parms.iter().map(|p| p.name.as_str()));
    let call = format!("{delegate}({})", args.join(", "));
    if service.return_type == "none" {
        out.push_str(&format!("    {call};\n"));
        out.push_str(&format!("    delete[] {};\n", vararg.name));
    } else {
        let ret_ty = match style {
            Style::Cpp => types.client_type(&service.return_type)?,
            Style::C => types.client_type_flat(&service.return_type)?,
        };
        out.push_str(&format!("    {ret_ty} ret = {call};\n"));
        out.push_str(&format!("    delete[] {};\n", vararg.name));
        out.push_str("    return ret;\n");
    }
    out.push_str("}\n");
    Ok(out)
}
