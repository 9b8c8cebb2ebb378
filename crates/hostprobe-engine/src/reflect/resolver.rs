//! Type resolution for symbolic type references
//!
//! A symbolic reference is an ordered list of class names that denote the
//! same semantic type across host releases. The first name the registry
//! knows wins; when none is known the reference is simply unresolved.

use std::fmt;

use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::class::ClassId;
use crate::config::TypeCandidates;
use crate::registry::ClassRegistry;

/// Resolve the first candidate the registry knows
pub fn resolve<S: AsRef<str>>(registry: &ClassRegistry, candidates: &[S]) -> Option<ClassId> {
    candidates.iter().find_map(|name| {
        let found = registry.get_class_by_name(name.as_ref()).map(|c| c.id);
        trace!(candidate = name.as_ref(), found = found.is_some(), "type candidate");
        found
    })
}

/// A resolved symbolic reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeBinding {
    /// Resolved class
    pub class_id: ClassId,
    /// Candidate name that resolved
    pub name: String,
}

/// Ordered class-name candidates for one semantic type
///
/// The first resolution outcome, including "unresolved", is cached for the
/// lifetime of the reference and returned by every later call.
#[derive(Debug)]
pub struct SymbolicTypeRef {
    candidates: Vec<String>,
    binding: OnceCell<Option<TypeBinding>>,
}

impl SymbolicTypeRef {
    /// Create an unresolved reference
    pub fn new<I, S>(candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            candidates: candidates.into_iter().map(Into::into).collect(),
            binding: OnceCell::new(),
        }
    }

    /// Candidate names in resolution order
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// Resolve against `registry`, or return the cached outcome
    pub fn resolve(&self, registry: &ClassRegistry) -> Option<ClassId> {
        self.binding
            .get_or_init(|| {
                let class_id = resolve(registry, &self.candidates)?;
                Some(TypeBinding {
                    class_id,
                    name: registry.type_name(class_id).to_string(),
                })
            })
            .as_ref()
            .map(|b| b.class_id)
    }

    /// Cached binding; None when unresolved or not yet resolved
    pub fn binding(&self) -> Option<&TypeBinding> {
        self.binding.get().and_then(Option::as_ref)
    }

    /// Whether resolution has been attempted
    pub fn is_settled(&self) -> bool {
        self.binding.get().is_some()
    }
}

/// Semantic roles the navigator needs resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostRole {
    /// Acceptance handler installed on listening channels
    Acceptor,
    /// Connection manager owned by the internal server
    ConnectionManager,
    /// Internal server object
    InternalServer,
    /// Public server wrapper
    ServerWrapper,
    /// Channel base type declaring the remote address
    AbstractChannel,
    /// Asynchronous bind result
    BindFuture,
    /// Listening channel
    ServerChannel,
}

impl HostRole {
    /// All roles, in binding order
    pub const ALL: [HostRole; 7] = [
        HostRole::Acceptor,
        HostRole::ConnectionManager,
        HostRole::InternalServer,
        HostRole::ServerWrapper,
        HostRole::AbstractChannel,
        HostRole::BindFuture,
        HostRole::ServerChannel,
    ];

    /// Config key for the role
    pub fn key(self) -> &'static str {
        match self {
            HostRole::Acceptor => "acceptor",
            HostRole::ConnectionManager => "connection_manager",
            HostRole::InternalServer => "internal_server",
            HostRole::ServerWrapper => "server_wrapper",
            HostRole::AbstractChannel => "abstract_channel",
            HostRole::BindFuture => "bind_future",
            HostRole::ServerChannel => "server_channel",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Host type bindings, resolved once and immutable afterwards
#[derive(Debug)]
pub struct HostTypes {
    refs: [SymbolicTypeRef; 7],
}

impl HostTypes {
    /// Resolve every role in one pass
    pub fn resolve(registry: &ClassRegistry, candidates: &TypeCandidates) -> Self {
        let refs = HostRole::ALL
            .map(|role| SymbolicTypeRef::new(candidates.for_role(role).iter().cloned()));
        for (role, reference) in HostRole::ALL.iter().zip(&refs) {
            let resolved = reference.resolve(registry);
            debug!(role = role.key(), resolved = ?resolved, "resolved host role");
        }
        Self { refs }
    }

    /// Class bound to a role
    pub fn get(&self, role: HostRole) -> Option<ClassId> {
        self.reference(role).binding().map(|b| b.class_id)
    }

    /// Symbolic reference backing a role
    pub fn reference(&self, role: HostRole) -> &SymbolicTypeRef {
        &self.refs[role.index()]
    }

    /// Roles that did not resolve on this host
    pub fn unresolved(&self) -> Vec<HostRole> {
        HostRole::ALL
            .into_iter()
            .filter(|&role| self.get(role).is_none())
            .collect()
    }
}

impl fmt::Display for HostTypes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostTypes{{")?;
        for (i, role) in HostRole::ALL.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match self.reference(*role).binding() {
                Some(binding) => write!(f, "{}={}", role.key(), binding.name)?,
                None => write!(f, "{}=<unresolved>", role.key())?,
            }
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::class::ClassBuilder;
    use crate::registry::create_standard_registry;

    fn registry_with(names: &[&str]) -> ClassRegistry {
        let mut registry = create_standard_registry();
        for name in names {
            registry.define(ClassBuilder::new(name)).unwrap();
        }
        registry
    }

    #[test]
    fn test_resolve_prefers_first_loadable_candidate() {
        let registry = registry_with(&["host.v2.Server", "host.Server"]);
        let first = registry.get_class_by_name("host.Server").unwrap().id;

        let resolved = resolve(&registry, &["host.Missing", "host.Server", "host.v2.Server"]);
        assert_eq!(resolved, Some(first));
    }

    #[test]
    fn test_resolve_none_loadable() {
        let registry = registry_with(&[]);
        assert_eq!(resolve(&registry, &["a.B", "c.D"]), None);
        assert_eq!(resolve::<&str>(&registry, &[]), None);
    }

    #[test]
    fn test_symbolic_ref_caches_outcome() {
        let mut registry = registry_with(&[]);
        let reference = SymbolicTypeRef::new(["late.Type"]);
        assert!(!reference.is_settled());
        assert_eq!(reference.resolve(&registry), None);
        assert!(reference.is_settled());

        // Defining the class later does not re-resolve the reference.
        registry.define(ClassBuilder::new("late.Type")).unwrap();
        assert_eq!(reference.resolve(&registry), None);

        let fresh = SymbolicTypeRef::new(["late.Type"]);
        assert!(fresh.resolve(&registry).is_some());
        assert_eq!(fresh.binding().unwrap().name, "late.Type");
    }

    #[test]
    fn test_host_types_resolve_and_display() {
        let registry = registry_with(&[
            "net.minecraft.server.MinecraftServer",
            "org.bukkit.craftbukkit.v1_19_R1.CraftServer",
        ]);
        let types = HostTypes::resolve(&registry, &TypeCandidates::default());

        assert!(types.get(HostRole::InternalServer).is_some());
        assert_eq!(
            types.reference(HostRole::ServerWrapper).binding().unwrap().name,
            "org.bukkit.craftbukkit.v1_19_R1.CraftServer"
        );
        assert!(types.get(HostRole::Acceptor).is_none());
        assert_eq!(types.unresolved().len(), 5);

        let text = types.to_string();
        assert!(text.starts_with("HostTypes{acceptor=<unresolved>"));
        assert!(text.contains("internal_server=net.minecraft.server.MinecraftServer"));
    }

    #[test]
    fn test_role_keys_match_index_order() {
        for (i, role) in HostRole::ALL.iter().enumerate() {
            assert_eq!(role.index(), i);
        }
    }
}
