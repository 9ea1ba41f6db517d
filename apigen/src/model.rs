//! Queryable API description model.
//!
//! Built once per run from the parsed [`schema::ApiFile`], held read-only by
//! every generator. Construction flattens the class forest into an arena with
//! a single pre-order walk, recording each class's enclosing chain along the
//! way, and validates the structural rules serde cannot see: duplicate class
//! names, unknown or cyclic `extends` links, and dangling `array_len`
//! bindings.

use std::collections::HashMap;

use anyhow::{Result, bail};
use tracing::info;

use crate::schema::{
    self, ApiFile, ClassDecl, ConstructorDecl, FieldDecl, ParameterDecl, ServiceDecl, Version,
};

/// Index into the flattened class arena.
pub type ClassId = usize;

/// A class with its nesting context resolved.
#[derive(Debug)]
pub struct ClassDesc {
    pub name: String,
    pub extends: Option<String>,
    pub flags: Vec<String>,
    pub fields: Vec<FieldDecl>,
    pub constructors: Vec<ConstructorDecl>,
    pub services: Vec<ServiceDecl>,
    pub callbacks: Vec<ServiceDecl>,
    /// Enclosing class names, outermost first. Empty for top-level classes.
    pub containers: Vec<String>,
    /// Arena ids of directly nested classes, in declaration order.
    pub nested: Vec<ClassId>,
}

impl ClassDesc {
    pub fn has_parent(&self) -> bool {
        self.extends.is_some()
    }

    pub fn has_extras_header(&self) -> bool {
        self.flags.iter().any(|f| f == schema::FLAG_HAS_EXTRAS)
    }

    pub fn is_listenable(&self) -> bool {
        self.flags.iter().any(|f| f == schema::FLAG_LISTENABLE)
    }
}

impl ServiceDecl {
    /// Base name plus disambiguating suffix — the duplicate-suppression key.
    pub fn overload_name(&self) -> String {
        format!("{}{}", self.name, self.overload_suffix)
    }

    /// A service can be rendered variadic if any parameter allows it.
    pub fn is_vararg(&self) -> bool {
        self.parms.iter().any(|p| p.can_be_vararg())
    }

    pub fn is_static(&self) -> bool {
        self.flags.iter().any(|f| f == schema::FLAG_STATIC)
    }

    pub fn sets_allocators(&self) -> bool {
        self.flags.iter().any(|f| f == schema::FLAG_SETS_ALLOCATORS)
    }

    pub fn has_impl_default(&self) -> bool {
        self.flags.iter().any(|f| f == schema::FLAG_IMPL_DEFAULT)
    }

    pub fn visibility(&self) -> &'static str {
        if self.flags.iter().any(|f| f == schema::FLAG_PROTECTED) {
            "protected"
        } else {
            "public"
        }
    }
}

impl ConstructorDecl {
    pub fn visibility(&self) -> &'static str {
        if self.flags.iter().any(|f| f == schema::FLAG_PROTECTED) {
            "protected"
        } else {
            "public"
        }
    }
}

impl ParameterDecl {
    pub fn is_in_out(&self) -> bool {
        self.attributes.iter().any(|a| a == schema::ATTR_IN_OUT)
    }

    pub fn is_array(&self) -> bool {
        self.attributes.iter().any(|a| a == schema::ATTR_ARRAY)
    }

    pub fn can_be_vararg(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| a == schema::ATTR_CAN_BE_VARARG)
    }
}

/// The complete, validated API description.
#[derive(Debug)]
pub struct ApiDescription {
    pub project: String,
    pub version: Version,
    pub namespaces: Vec<String>,
    /// Free-standing services (not members of any class).
    pub services: Vec<ServiceDecl>,
    classes: Vec<ClassDesc>,
    top_level: Vec<ClassId>,
    by_name: HashMap<String, ClassId>,
}

impl ApiDescription {
    /// Build the model from a parsed description, validating class links.
    pub fn from_file(api: ApiFile) -> Result<Self> {
        let mut classes = Vec::new();
        let mut by_name = HashMap::new();
        let mut top_level = Vec::new();

        for decl in api.classes {
            let id = flatten_class(decl, &[], &mut classes, &mut by_name)?;
            top_level.push(id);
        }

        let model = ApiDescription {
            project: api.project,
            version: api.version,
            namespaces: api.namespace,
            services: api.services,
            classes,
            top_level,
            by_name,
        };
        model.validate()?;

        info!(
            project = %model.project,
            classes = model.classes.len(),
            top_level = model.top_level.len(),
            free_services = model.services.len(),
            "built API description model"
        );
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        for class in &self.classes {
            // Parent links must resolve, and the extends chain must be
            // acyclic so base() terminates.
            if class.has_parent() {
                let mut seen = vec![class.name.as_str()];
                let mut current = class;
                while let Some(parent_name) = current.extends.as_deref() {
                    if seen.contains(&parent_name) {
                        bail!(
                            "cyclic extends chain involving class `{}`: {}",
                            parent_name,
                            seen.join(" -> ")
                        );
                    }
                    let Some(&id) = self.by_name.get(parent_name) else {
                        bail!(
                            "class `{}` extends unknown class `{}`",
                            current.name,
                            parent_name
                        );
                    };
                    seen.push(parent_name);
                    current = &self.classes[id];
                }
            }

            for service in class.services.iter().chain(class.callbacks.iter()) {
                validate_parameters(service, &class.name)?;
            }
        }

        for service in &self.services {
            validate_parameters(service, "<free-standing>")?;
        }
        Ok(())
    }

    /// All classes, flattened, in pre-order over the declaration forest.
    pub fn all_classes(&self) -> impl Iterator<Item = &ClassDesc> {
        self.classes.iter()
    }

    /// Top-level classes only, in declaration order.
    pub fn top_level_classes(&self) -> impl Iterator<Item = &ClassDesc> {
        self.top_level.iter().map(|&id| &self.classes[id])
    }

    /// Directly nested classes of `class`, in declaration order.
    pub fn nested_classes<'a>(
        &'a self,
        class: &'a ClassDesc,
    ) -> impl Iterator<Item = &'a ClassDesc> {
        class.nested.iter().map(|&id| &self.classes[id])
    }

    /// Look up any class (top-level or nested) by name.
    pub fn class_by_name(&self, name: &str) -> Result<&ClassDesc> {
        match self.by_name.get(name) {
            Some(&id) => Ok(&self.classes[id]),
            None => bail!("unknown class `{name}` in API description"),
        }
    }

    /// True if `name` names a class anywhere in the description.
    pub fn is_class(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Enclosing class names of `name`, outermost first.
    pub fn containing_classes(&self, name: &str) -> Result<&[String]> {
        Ok(&self.class_by_name(name)?.containers)
    }

    /// Parent class under the single-inheritance relation, if any.
    pub fn parent_of<'a>(&'a self, class: &ClassDesc) -> Option<&'a ClassDesc> {
        let parent = class.extends.as_deref()?;
        let id = self.by_name[parent];
        Some(&self.classes[id])
    }

    /// Root of the extends chain: `base(c) = base(parent(c))`, else `c`.
    pub fn base_of<'a>(&'a self, class: &'a ClassDesc) -> &'a ClassDesc {
        let mut current = class;
        while let Some(parent) = self.parent_of(current) {
            current = parent;
        }
        current
    }

    /// The struct-embedding relation used by the C variant. Today it tracks
    /// the same link as `extends`, but it is a distinct relation: the C
    /// generator asks for an embedded base, never for an inheritance parent.
    pub fn embedded_base<'a>(&'a self, class: &ClassDesc) -> Option<&'a ClassDesc> {
        self.parent_of(class)
    }

    /// A class's services with later duplicate overload names suppressed —
    /// first declaration wins.
    pub fn declared_services<'a>(&self, class: &'a ClassDesc) -> Vec<&'a ServiceDecl> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for service in &class.services {
            let overload = service.overload_name();
            if seen.contains(&overload) {
                continue;
            }
            seen.push(overload);
            out.push(service);
        }
        out
    }

    /// Free-standing services with later duplicate overload names
    /// suppressed — same first-wins rule as [`declared_services`].
    ///
    /// [`declared_services`]: ApiDescription::declared_services
    pub fn declared_free_services(&self) -> Vec<&ServiceDecl> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        for service in &self.services {
            let overload = service.overload_name();
            if seen.contains(&overload) {
                continue;
            }
            seen.push(overload);
            out.push(service);
        }
        out
    }

    /// Every hook a recorder for `class` must override: services and
    /// callbacks of the class and all its ancestors, deduplicated by
    /// overload name (nearest declaration wins).
    pub fn recorder_hooks<'a>(&'a self, class: &'a ClassDesc) -> Vec<&'a ServiceDecl> {
        let mut seen: Vec<String> = Vec::new();
        let mut out = Vec::new();
        let mut current = Some(class);
        while let Some(c) = current {
            for service in c.services.iter().chain(c.callbacks.iter()) {
                let overload = service.overload_name();
                if seen.contains(&overload) {
                    continue;
                }
                seen.push(overload);
                out.push(service);
            }
            current = self.parent_of(c);
        }
        out
    }

    /// Classes flagged as instrumentable by the listener/recorder variant.
    pub fn listenable_classes(&self) -> Vec<&ClassDesc> {
        self.all_classes().filter(|c| c.is_listenable()).collect()
    }
}

/// Pre-order flattening: assign the class an arena slot, then descend into
/// its nested classes with the enclosing chain extended by this class's
/// name, before any sibling is visited.
fn flatten_class(
    decl: ClassDecl,
    containers: &[String],
    classes: &mut Vec<ClassDesc>,
    by_name: &mut HashMap<String, ClassId>,
) -> Result<ClassId> {
    if by_name.contains_key(&decl.name) {
        bail!("duplicate class name `{}` in API description", decl.name);
    }

    let id = classes.len();
    classes.push(ClassDesc {
        name: decl.name.clone(),
        extends: decl.extends,
        flags: decl.flags,
        fields: decl.fields,
        constructors: decl.constructors,
        services: decl.services,
        callbacks: decl.callbacks,
        containers: containers.to_vec(),
        nested: Vec::new(),
    });
    by_name.insert(decl.name.clone(), id);

    let mut inner_containers = containers.to_vec();
    inner_containers.push(decl.name);
    let mut nested = Vec::new();
    for inner in decl.types {
        nested.push(flatten_class(inner, &inner_containers, classes, by_name)?);
    }
    classes[id].nested = nested;
    Ok(id)
}

/// Attribute-level rules: an array parameter must name an existing length
/// parameter, and a vararg-eligible parameter must be an array (the
/// variadic form replaces exactly the array role).
fn validate_parameters(service: &ServiceDecl, owner: &str) -> Result<()> {
    for (i, parm) in service.parms.iter().enumerate() {
        if parm.is_array() {
            let Some(len_name) = parm.array_len.as_deref() else {
                bail!(
                    "array parameter `{}` of `{}::{}` is missing its array_len binding",
                    parm.name,
                    owner,
                    service.name
                );
            };
            if !service.parms.iter().any(|p| p.name == len_name) {
                bail!(
                    "array parameter `{}` of `{}::{}` binds length to unknown parameter `{}`",
                    parm.name,
                    owner,
                    service.name,
                    len_name
                );
            }
        }
        if parm.can_be_vararg() {
            if !parm.is_array() {
                bail!(
                    "parameter `{}` of `{}::{}` is vararg-eligible but not an array",
                    parm.name,
                    owner,
                    service.name
                );
            }
            // The variadic form replaces this parameter with `...`, which
            // must sit at the end of the signature.
            if i + 1 != service.parms.len() {
                bail!(
                    "vararg-eligible parameter `{}` of `{}::{}` must be the last parameter",
                    parm.name,
                    owner,
                    service.name
                );
            }
        }
    }
    Ok(())
}
