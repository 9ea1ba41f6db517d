//! C client generator.
//!
//! The C surface has no classes, namespaces, or overloading: class names are
//! flattened (`OuterInner`), every member function takes an explicit `self`
//! first parameter, and "inheritance" is the struct-embedding relation — the
//! base struct sits by value as the first field, named `super`, so a derived
//! pointer reinterprets as its root base. Headers are plain C; the sources
//! bridge into the C++ implementation and are compiled as C++, exactly like
//! the original C client.

use std::path::Path;

use anyhow::Result;
use tracing::debug;

use crate::cppgen::{
    Style, arg_setup, arg_teardown, banner, call_arg, include_line, parm_list, service_body,
    vararg_body, vararg_parm_list,
};
use crate::model::{ApiDescription, ClassDesc};
use crate::naming;
use crate::output::Artifact;
use crate::schema::{ParameterDecl, ServiceDecl};
use crate::types::TypeMap;

pub struct CGenerator<'a> {
    model: &'a ApiDescription,
    types: &'a TypeMap<'a>,
}

impl<'a> CGenerator<'a> {
    pub fn new(model: &'a ApiDescription, types: &'a TypeMap<'a>) -> Self {
        CGenerator { model, types }
    }

    /// Generate every C client artifact: a header/source pair per top-level
    /// class and the aggregate project pair.
    pub fn generate(&self, header_dir: &Path, source_dir: &Path) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for class in self.model.top_level_classes() {
            artifacts.push(Artifact::new(
                header_dir.join(format!("{}.h", class.name)),
                self.class_header(class)?,
            ));
            artifacts.push(Artifact::new(
                source_dir.join(format!("{}.cpp", class.name)),
                self.class_source(class)?,
            ));
            debug!(class = %class.name, "generated C client class");
        }
        artifacts.push(Artifact::new(
            header_dir.join(format!("{}.h", self.model.project)),
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

        out.push_str("#include <stdbool.h>\n#include <stddef.h>\n#include <stdint.h>\n");
        if let Some(base) = self.model.embedded_base(class) {
            out.push_str(&include_line(&format!("{}.h", base.name)));
        }
        if class.has_extras_header() {
            out.push_str(&include_line(&format!("{}ExtrasOutsideClass.hpp", class.name)));
        }
        out.push('\n');

        out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");

        // Forward declarations for all API classes, nested ones included —
        // flattening makes them ordinary top-level struct names.
        out.push_str("// forward declarations for all API classes\n");
        for c in self.model.all_classes() {
            let flat = naming::flat_class(c);
            out.push_str(&format!("typedef struct {flat} {flat};\n"));
        }
        out.push('\n');

        self.class_def(class, &mut out)?;

        out.push_str("#ifdef __cplusplus\n}\n#endif\n\n");
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    /// Struct plus function declarations for a class, then recursively for
    /// its nested classes (flattened to siblings).
    fn class_def(&self, class: &ClassDesc, out: &mut String) -> Result<()> {
        let flat = naming::flat_class(class);

        out.push_str(&format!("struct {flat} {{\n"));
        if let Some(base) = self.model.embedded_base(class) {
            // The embedded base must be the first field: a derived pointer
            // reinterprets as any ancestor.
            out.push_str(&format!("    {} super;\n", naming::flat_class(base)));
        }
        for field in &class.fields {
            out.push_str(&format!(
                "    {} {};\n",
                self.types.client_type_flat(&field.ty)?,
                field.name
            ));
        }
        if self.model.embedded_base(class).is_none() {
            out.push_str("    void * _impl;\n");
        }
        if class.has_extras_header() {
            out.push_str(&include_line(&format!("{}ExtrasInsideClass.hpp", class.name)));
        }
        out.push_str("};\n");

        for (i, ctor) in class.constructors.iter().enumerate() {
            out.push_str(&format!(
                "{flat} * {}({});\n",
                naming::c_constructor(class, i),
                parm_list(self.types, &ctor.parms, Style::C)?
            ));
        }
        out.push_str(&format!(
            "void * {}(void * impl);\n",
            naming::allocator(class)
        ));
        out.push_str(&format!(
            "void {}({flat} * self, void * impl);\n",
            naming::c_initializer(class)
        ));
        out.push_str(&format!(
            "void {}({flat} * self);\n",
            naming::c_destructor(class)
        ));

        for callback in &class.callbacks {
            out.push_str(&self.service_decl(class, callback, true)?);
        }
        for service in self.model.declared_services(class) {
            out.push_str(&self.service_decl(class, service, false)?);
        }
        out.push('\n');

        for nested in self.model.nested_classes(class) {
            self.class_def(nested, out)?;
        }
        Ok(())
    }

    fn service_decl(
        &self,
        class: &ClassDesc,
        service: &ServiceDecl,
        is_callback: bool,
    ) -> Result<String> {
        let ret = self.types.client_type_flat(&service.return_type)?;
        let name = if is_callback {
            format!("{}_{}", naming::flat_class(class), service.name)
        } else {
            naming::c_service(class, service)
        };
        let mut decl = format!(
            "{ret} {name}({});\n",
            self.self_parm_list(class, service, &service.parms)?
        );
        if service.is_vararg() {
            decl.push_str(&format!(
                "{ret} {}({});\n",
                naming::c_vararg_service(class, service),
                self.self_vararg_parm_list(class, service)?
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
        if crate::cppgen::class_tree_has_vararg(self.model, class) {
            out.push_str("#include <cstdarg>\n");
        }
        for c in self.model.top_level_classes() {
            out.push_str(&include_line(&format!("{}.h", c.name)));
        }
        out.push_str(&include_line("Callbacks.hpp"));
        out.push_str(&include_line("Macros.hpp"));
        out.push('\n');

        self.class_impls(class, &mut out)?;
        Ok(out)
    }

    fn class_impls(&self, class: &ClassDesc, out: &mut String) -> Result<()> {
        let flat = naming::flat_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);

        for callback in &class.callbacks {
            out.push_str(&self.callback_thunk_def(class, callback)?);
            out.push('\n');
        }

        for (i, ctor) in class.constructors.iter().enumerate() {
            let mut body = format!(
                "extern \"C\" {flat} * {}({}) {{\n",
                naming::c_constructor(class, i),
                parm_list(self.types, &ctor.parms, Style::C)?
            );
            body.push_str(&format!("    {flat} * self = new {flat}();\n"));
            for parm in &ctor.parms {
                if let Some(line) = arg_setup(self.types, parm)? {
                    body.push_str(&format!("    {line}\n"));
                }
            }
            let args: Result<Vec<String>> = ctor
                .parms
                .iter()
                .map(|p| call_arg(self.model, self.types, Style::C, p))
                .collect();
            body.push_str(&format!(
                "    {impl_class} * implObj = new {impl_class}({});\n",
                args?.join(", ")
            ));
            for parm in &ctor.parms {
                if let Some(line) = arg_teardown(self.types, parm)? {
                    body.push_str(&format!("    {line}\n"));
                }
            }
            body.push_str("    implObj->setClient(self);\n");
            body.push_str(&format!("    {}(self, implObj);\n", naming::c_initializer(class)));
            body.push_str("    return self;\n}\n\n");
            out.push_str(&body);
        }

        // The allocator doubles as the adopt-an-impl constructor.
        out.push_str(&format!(
            "extern \"C\" void * {}(void * impl) {{\n    \
             {flat} * self = new {flat}();\n    \
             static_cast<{impl_class} *>(impl)->setClient(self);\n    \
             {}(self, impl);\n    \
             return self;\n}}\n\n",
            naming::allocator(class),
            naming::c_initializer(class)
        ));

        out.push_str(&self.initializer_def(class)?);
        out.push('\n');

        out.push_str(&format!(
            "extern \"C\" void {}({flat} * self) {{\n    delete self;\n}}\n\n",
            naming::c_destructor(class)
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

        for nested in self.model.nested_classes(class) {
            self.class_impls(nested, out)?;
        }
        Ok(())
    }

    fn initializer_def(&self, class: &ClassDesc) -> Result<String> {
        let flat = naming::flat_class(class);
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);

        let mut out = format!(
            "extern \"C\" void {}({flat} * self, void * impl) {{\n",
            naming::c_initializer(class)
        );
        match self.model.embedded_base(class) {
            Some(base) => out.push_str(&format!(
                "    {}(reinterpret_cast<{} *>(self), impl);\n",
                naming::c_initializer(base),
                naming::flat_class(base)
            )),
            None => out.push_str("    self->_impl = impl;\n"),
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
                let base_class = self.model.class_by_name(&base)?;
                out.push_str(&format!(
                    "    GET_CLIENT_OBJECT(clientObj_{0}, {1}, implObj->{0});\n    \
                     self->{0} = clientObj_{0};\n",
                    field.name,
                    naming::flat_class(base_class)
                ));
            } else {
                out.push_str(&format!("    self->{0} = implObj->{0};\n", field.name));
            }
        }
        out.push_str("}\n");
        Ok(out)
    }

    /// Thunk from the implementation back into the client callback function.
    fn callback_thunk_def(&self, class: &ClassDesc, callback: &ServiceDecl) -> Result<String> {
        let flat = naming::flat_class(class);
        let ret = self.types.client_type_flat(&callback.return_type)?;
        let parms = parm_list(self.types, &callback.parms, Style::C)?;
        let lead = if parms.is_empty() { String::new() } else { format!(", {parms}") };
        let mut args: Vec<&str> = vec!["client"];
        args.extend(callback.parms.iter().map(|p| p.name.as_str()));
        let forward = format!("{flat}_{}({})", callback.name, args.join(", "));

        let mut out = format!(
            "extern \"C\" {ret} {}(void * clientObj{lead}) {{\n",
            naming::callback_thunk(class, callback)
        );
        out.push_str(&format!(
            "    {flat} * client = reinterpret_cast<{flat} *>(clientObj);\n"
        ));
        if callback.return_type == "none" {
            out.push_str(&format!("    {forward};\n"));
        } else {
            out.push_str(&format!("    return {forward};\n"));
        }
        out.push_str("}\n");
        Ok(out)
    }

    fn callback_default_def(&self, class: &ClassDesc, callback: &ServiceDecl) -> Result<String> {
        let flat = naming::flat_class(class);
        let ret = self.types.client_type_flat(&callback.return_type)?;
        let signature = format!(
            "extern \"C\" {ret} {flat}_{}({})",
            callback.name,
            self.self_parm_list(class, callback, &callback.parms)?
        );

        if callback.has_impl_default() {
            let target = format!(
                "static_cast<{} *>({})->{}",
                naming::impl_class(self.types.impl_namespace(), class),
                self.self_impl_expr(class),
                callback.name
            );
            let body = service_body(self.model, self.types, Style::C, callback, &target, false)?;
            return Ok(format!("{signature} {body}"));
        }

        let body = if callback.return_type == "none" {
            "{}\n".to_string()
        } else if self.types.needs_conversion(&callback.return_type) || ret.ends_with('*') {
            "{ return NULL; }\n".to_string()
        } else if callback.return_type == "boolean" {
            "{ return false; }\n".to_string()
        } else {
            "{ return 0; }\n".to_string()
        };
        Ok(format!("{signature} {body}"))
    }

    fn service_def(&self, class: &ClassDesc, service: &ServiceDecl) -> Result<String> {
        let impl_class = naming::impl_class(self.types.impl_namespace(), class);
        let target = if service.is_static() {
            format!("{impl_class}::{}", service.name)
        } else {
            format!(
                "static_cast<{impl_class} *>({})->{}",
                self.self_impl_expr(class),
                service.name
            )
        };
        let body = service_body(
            self.model,
            self.types,
            Style::C,
            service,
            &target,
            service.sets_allocators(),
        )?;
        Ok(format!(
            "extern \"C\" {} {}({}) {}",
            self.types.client_type_flat(&service.return_type)?,
            naming::c_service(class, service),
            self.self_parm_list(class, service, &service.parms)?,
            body
        ))
    }

    fn vararg_def(&self, class: &ClassDesc, service: &ServiceDecl) -> Result<String> {
        let signature = format!(
            "extern \"C\" {} {}({})",
            self.types.client_type_flat(&service.return_type)?,
            naming::c_vararg_service(class, service),
            self.self_vararg_parm_list(class, service)?
        );
        let delegate = naming::c_service(class, service);
        let self_arg = if service.is_static() { None } else { Some("self") };
        vararg_body(self.types, Style::C, service, &signature, &delegate, self_arg)
    }

    // -----------------------------------------------------------------------
    // Aggregate artifacts for free-standing services
    // -----------------------------------------------------------------------

    fn common_header(&self) -> Result<String> {
        let mut out = banner(&self.model.project);
        let guard = naming::include_guard(&self.model.project);
        out.push_str(&format!("#ifndef {guard}\n#define {guard}\n\n"));
        for class in self.model.top_level_classes() {
            out.push_str(&include_line(&format!("{}.h", class.name)));
        }
        out.push('\n');

        out.push_str("#ifdef __cplusplus\nextern \"C\" {\n#endif\n\n");
        for service in self.model.declared_free_services() {
            let ret = self.types.client_type_flat(&service.return_type)?;
            out.push_str(&format!(
                "{ret} {}({});\n",
                service.overload_name(),
                parm_list(self.types, &service.parms, Style::C)?
            ));
            if service.is_vararg() {
                out.push_str(&format!(
                    "{ret} {}_v({});\n",
                    service.overload_name(),
                    vararg_parm_list(self.types, &service.parms, Style::C)?
                ));
            }
        }
        out.push('\n');
        out.push_str("#ifdef __cplusplus\n}\n#endif\n\n");
        out.push_str(&format!("#endif // {guard}\n"));
        Ok(out)
    }

    fn common_source(&self) -> Result<String> {
        let mut out = banner(&self.model.project);
        out.push_str("#include <cstddef>\n");
        if self.model.services.iter().any(|s| s.is_vararg()) {
            out.push_str("#include <cstdarg>\n");
        }
        out.push_str(&include_line(&format!("{}.h", self.model.project)));
        out.push_str(&include_line("Callbacks.hpp"));
        out.push_str(&include_line("Macros.hpp"));
        out.push('\n');

        for service in self.model.declared_free_services() {
            let target = naming::impl_service(service);
            let body = service_body(
                self.model,
                self.types,
                Style::C,
                service,
                &target,
                service.sets_allocators(),
            )?;
            out.push_str(&format!(
                "extern \"C\" {} {}({}) {}",
                self.types.client_type_flat(&service.return_type)?,
                service.overload_name(),
                parm_list(self.types, &service.parms, Style::C)?,
                body
            ));
            out.push('\n');
            if service.is_vararg() {
                let signature = format!(
                    "extern \"C\" {} {}_v({})",
                    self.types.client_type_flat(&service.return_type)?,
                    service.overload_name(),
                    vararg_parm_list(self.types, &service.parms, Style::C)?
                );
                out.push_str(&vararg_body(
                    self.types,
                    Style::C,
                    service,
                    &signature,
                    &service.overload_name(),
                    None,
                )?);
                out.push('\n');
            }
        }
        Ok(out)
    }

    // -----------------------------------------------------------------------
    // Small pieces
    // -----------------------------------------------------------------------

    /// `self->_impl`, reaching through the embedded base chain when the
    /// slot lives on the root struct.
    fn self_impl_expr(&self, class: &ClassDesc) -> String {
        if self.model.embedded_base(class).is_none() {
            "self->_impl".to_string()
        } else {
            format!(
                "reinterpret_cast<{} *>(self)->_impl",
                naming::c_impl_root(self.model, class)
            )
        }
    }

    /// Parameter list with the explicit `self` prepended (omitted for
    /// static services, which have no receiver).
    fn self_parm_list(
        &self,
        class: &ClassDesc,
        service: &ServiceDecl,
        parms: &[ParameterDecl],
    ) -> Result<String> {
        let rest = parm_list(self.types, parms, Style::C)?;
        if service.is_static() {
            return Ok(rest);
        }
        let self_parm = format!("{} * self", naming::flat_class(class));
        if rest.is_empty() {
            Ok(self_parm)
        } else {
            Ok(format!("{self_parm}, {rest}"))
        }
    }

    fn self_vararg_parm_list(&self, class: &ClassDesc, service: &ServiceDecl) -> Result<String> {
        let rest = vararg_parm_list(self.types, &service.parms, Style::C)?;
        if service.is_static() {
            return Ok(rest);
        }
        let self_parm = format!("{} * self", naming::flat_class(class));
        if rest.is_empty() {
            Ok(self_parm)
        } else {
            Ok(format!("{self_parm}, {rest}"))
        }
    }
}
