//! Object graph navigation from the host server down to its listener
//!
//! The walk goes server wrapper -> internal server -> connection manager ->
//! listening channel -> acceptance handler -> child bindings. Each hop
//! uses whichever search survives host drift best: accessor methods and
//! named fields first, type-directed search where names are unreliable,
//! and value shape where several fields share a type.
//!
//! Every lookup reports absence rather than failing; a missing hop is
//! logged and leaves unrelated lookups untouched.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::class::ClassId;
use crate::config::ProbeConfig;
use crate::error::{HostError, ProbeError, ProbeResult};
use crate::object::Value;
use crate::reflect::handles::FieldHandle;
use crate::reflect::patch::overwrite_field;
use crate::reflect::resolver::{HostRole, HostTypes};
use crate::reflect::search::{find_attribute, find_field_by_name, find_fields_by_type, find_method};
use crate::registry::{builtin, ClassRegistry};

/// Member names the navigator relies on
///
/// These are fixed per host release family; a family that renames them
/// needs its own candidate types, not different names.
pub mod members {
    /// Wrapper accessor returning the internal server
    pub const GET_SERVER: &str = "getServer";
    /// Wrapper field holding the internal server
    pub const CONSOLE: &str = "console";
    /// Internal server accessor returning the connection manager
    pub const GET_CONNECTION: &str = "getConnection";
    /// Internal server field holding the connection manager
    pub const CONNECTION: &str = "connection";
    /// Channel accessor returning its processing pipeline
    pub const PIPELINE: &str = "pipeline";
    /// Pipeline lookup by handler key
    pub const PIPELINE_GET: &str = "get";
    /// Bind result success flag
    pub const IS_SUCCESS: &str = "isSuccess";
    /// Bind result channel accessor
    pub const CHANNEL: &str = "channel";
    /// Acceptor field: handler installed on accepted channels
    pub const CHILD_HANDLER: &str = "childHandler";
    /// Acceptor field: options applied to accepted channels
    pub const CHILD_OPTIONS: &str = "childOptions";
    /// Acceptor field: attributes applied to accepted channels
    pub const CHILD_ATTRS: &str = "childAttrs";
    /// Channel field holding the peer address
    pub const REMOTE_ADDRESS: &str = "remoteAddress";
}

use members::*;

/// Child configuration read off an acceptance handler
///
/// Each entry is looked up independently; older hosts may lack some.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AcceptorBindings {
    /// Handler installed on accepted channels
    pub child_handler: Option<Value>,
    /// Options applied to accepted channels
    pub child_options: Option<Value>,
    /// Attributes applied to accepted channels
    pub child_attrs: Option<Value>,
}

/// Everything discovered between the server wrapper and its listener
#[derive(Debug, Clone)]
pub struct ListenerTopology {
    /// Internal server object
    pub internal_server: Value,
    /// Connection manager
    pub connection_manager: Value,
    /// Bound listening channel
    pub listening_channel: Value,
    /// Acceptance handler in the listening channel's pipeline
    pub acceptor: Value,
    /// Child bindings of the acceptance handler
    pub children: AcceptorBindings,
}

/// Navigator over one host's object graph
///
/// Type bindings are resolved once in [`HostNavigator::new`]; member
/// handles are derived again on every call.
#[derive(Debug)]
pub struct HostNavigator {
    registry: Arc<ClassRegistry>,
    types: HostTypes,
}

impl HostNavigator {
    /// Resolve host bindings from `config` against `registry`
    pub fn new(registry: Arc<ClassRegistry>, config: &ProbeConfig) -> Self {
        let types = HostTypes::resolve(&registry, &config.types);
        info!(%types, "resolved host type bindings");
        Self { registry, types }
    }

    /// Navigator using the default candidate names
    pub fn with_defaults(registry: Arc<ClassRegistry>) -> Self {
        Self::new(registry, &ProbeConfig::default())
    }

    /// Host class registry
    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    /// Resolved host bindings
    pub fn types(&self) -> &HostTypes {
        &self.types
    }

    fn role(&self, role: HostRole) -> Option<ClassId> {
        let class_id = self.types.get(role);
        if class_id.is_none() {
            debug!(role = role.key(), "host role unresolved");
        }
        class_id
    }

    /// Invoke `name` on `receiver`, searching from `class_id`
    fn call(
        &self,
        class_id: ClassId,
        receiver: &Value,
        name: &str,
        params: &[ClassId],
        args: &[Value],
    ) -> ProbeResult<Value> {
        let method = find_method(&self.registry, class_id, name, params)?.accessible();
        Ok(method.invoke(&self.registry, receiver, args)?)
    }

    /// Invoke `name` on `receiver`, searching from its runtime class
    fn call_on(
        &self,
        receiver: &Value,
        name: &str,
        params: &[ClassId],
        args: &[Value],
    ) -> ProbeResult<Value> {
        let class_id = receiver.runtime_class().ok_or(HostError::NullReceiver)?;
        self.call(class_id, receiver, name, params, args)
    }

    /// Read field `name` (searched from `class_id` upwards) off `instance`
    fn read(&self, class_id: ClassId, instance: &Value, name: &str) -> ProbeResult<Value> {
        let field = find_field_by_name(&self.registry, class_id, name).ok_or_else(|| {
            ProbeError::FieldNotFound {
                class: self.registry.type_name(class_id).to_string(),
                name: name.to_string(),
            }
        })?;
        Ok(field.accessible().get(&self.registry, instance)?)
    }

    /// Internal server behind the public wrapper
    ///
    /// Returns the wrapper itself when it already is the internal server;
    /// otherwise tries the `getServer` accessor, then the `console` field.
    pub fn locate_internal_server(&self, wrapper: &Value) -> Option<Value> {
        let internal = self.role(HostRole::InternalServer)?;
        if self.registry.is_instance(wrapper, internal) {
            return Some(wrapper.clone());
        }

        let wrapper_type = self.role(HostRole::ServerWrapper)?;
        match self.call(wrapper_type, wrapper, GET_SERVER, &[], &[]) {
            Ok(server) if self.registry.is_instance(&server, internal) => return Some(server),
            Ok(other) => debug!(
                got = %self.registry.describe(&other),
                "getServer returned a foreign object"
            ),
            Err(error) => debug!(%error, "getServer unavailable"),
        }

        match self.read(wrapper_type, wrapper, CONSOLE) {
            Ok(server) if self.registry.is_instance(&server, internal) => return Some(server),
            Ok(other) => debug!(
                got = %self.registry.describe(&other),
                "console holds a foreign object"
            ),
            Err(error) => debug!(%error, "console field unavailable"),
        }

        warn!(
            wrapper = %self.registry.describe(wrapper),
            "failed to locate internal server"
        );
        None
    }

    /// Connection manager owned by the internal server
    ///
    /// Tries the `getConnection` accessor, the `connection` field declared
    /// on the internal server type, and finally a type-directed search.
    pub fn locate_connection_manager(&self, server: &Value) -> Option<Value> {
        if server.is_null() {
            return None;
        }
        let internal = self.role(HostRole::InternalServer)?;
        let manager = self.role(HostRole::ConnectionManager)?;

        match self.call(internal, server, GET_CONNECTION, &[], &[]) {
            Ok(found) if self.registry.is_instance(&found, manager) => return Some(found),
            Ok(other) => debug!(
                got = %self.registry.describe(&other),
                "getConnection returned a foreign object"
            ),
            Err(error) => debug!(%error, "getConnection unavailable"),
        }

        let declared = self
            .registry
            .get_class(internal)
            .and_then(|class| class.declared_field(CONNECTION))
            .map(|decl| FieldHandle::new(internal, decl).accessible());
        match declared.map(|field| field.get(&self.registry, server)) {
            Some(Ok(found)) if self.registry.is_instance(&found, manager) => return Some(found),
            Some(Ok(other)) => debug!(
                got = %self.registry.describe(&other),
                "connection holds a foreign object"
            ),
            Some(Err(error)) => debug!(%error, "connection field unreadable"),
            None => debug!("no connection field declared"),
        }

        let found = find_attribute(&self.registry, internal, manager, server);
        if found.is_none() {
            warn!(
                server = %self.registry.describe(server),
                "failed to locate connection manager"
            );
        }
        found
    }

    /// Bound listening channel held by the connection manager
    ///
    /// Scans the manager's list-typed fields and accepts the first list whose
    /// first element is a successful bind result for a listening channel.
    /// Errors only if an access-overridden field still cannot be read.
    pub fn find_server_channel(&self, connection: &Value) -> ProbeResult<Option<Value>> {
        let Some(manager_class) = connection.runtime_class() else {
            return Ok(None);
        };
        let (Some(future_type), Some(channel_type)) =
            (self.role(HostRole::BindFuture), self.role(HostRole::ServerChannel))
        else {
            return Ok(None);
        };

        for field in find_fields_by_type(&self.registry, manager_class, builtin::LIST) {
            let field = field.accessible();
            let value = field.get(&self.registry, connection).map_err(|error| {
                ProbeError::Internal(format!(
                    "list field {} unreadable after access override: {}",
                    field.name(),
                    error
                ))
            })?;

            let Some(first) = value.as_list().and_then(|list| list.first()) else {
                continue;
            };
            if let Some(channel) = self.bound_channel(&first, future_type, channel_type) {
                debug!(field = field.name(), "found listening channel");
                return Ok(Some(channel));
            }
        }

        warn!(
            manager = %self.registry.describe(connection),
            "no list holds a bound listening channel"
        );
        Ok(None)
    }

    fn bound_channel(
        &self,
        candidate: &Value,
        future_type: ClassId,
        channel_type: ClassId,
    ) -> Option<Value> {
        if !self.registry.is_instance(candidate, future_type) {
            return None;
        }
        let success = self.call_on(candidate, IS_SUCCESS, &[], &[]).ok()?;
        if success.as_bool() != Some(true) {
            return None;
        }
        let channel = self.call_on(candidate, CHANNEL, &[], &[]).ok()?;
        self.registry
            .is_instance(&channel, channel_type)
            .then_some(channel)
    }

    /// Acceptance handler in the listening channel's pipeline
    ///
    /// The pipeline is keyed by the acceptor's class name.
    pub fn find_server_handler(&self, channel: &Value) -> Option<Value> {
        let acceptor = self.role(HostRole::Acceptor)?;

        let pipeline = match self.call_on(channel, PIPELINE, &[], &[]) {
            Ok(pipeline) => pipeline,
            Err(error) => {
                warn!(%error, "failed to get channel pipeline");
                return None;
            }
        };

        let key = Value::string(self.registry.type_name(acceptor));
        match self.call_on(&pipeline, PIPELINE_GET, &[builtin::STRING], &[key]) {
            Ok(handler) if self.registry.is_instance(&handler, acceptor) => Some(handler),
            Ok(other) => {
                warn!(got = %self.registry.describe(&other), "pipeline has no acceptance handler");
                None
            }
            Err(error) => {
                warn!(%error, "failed to query channel pipeline");
                None
            }
        }
    }

    fn acceptor_field(&self, acceptor: &Value, name: &str) -> Option<Value> {
        let acceptor_type = self.role(HostRole::Acceptor)?;
        match self.read(acceptor_type, acceptor, name) {
            Ok(value) if value.is_null() => None,
            Ok(value) => Some(value),
            Err(error) => {
                warn!(field = name, %error, "failed to get acceptor field");
                None
            }
        }
    }

    /// `childHandler` of the acceptance handler
    pub fn find_child_handler(&self, acceptor: &Value) -> Option<Value> {
        self.acceptor_field(acceptor, CHILD_HANDLER)
    }

    /// `childOptions` of the acceptance handler
    pub fn find_child_options(&self, acceptor: &Value) -> Option<Value> {
        self.acceptor_field(acceptor, CHILD_OPTIONS)
    }

    /// `childAttrs` of the acceptance handler
    pub fn find_child_attrs(&self, acceptor: &Value) -> Option<Value> {
        self.acceptor_field(acceptor, CHILD_ATTRS)
    }

    /// All child bindings; a missing one does not hide the others
    pub fn acceptor_bindings(&self, acceptor: &Value) -> AcceptorBindings {
        AcceptorBindings {
            child_handler: self.find_child_handler(acceptor),
            child_options: self.find_child_options(acceptor),
            child_attrs: self.find_child_attrs(acceptor),
        }
    }

    /// Replace the peer address a channel reports downstream
    pub fn set_remote_address(&self, channel: &Value, address: Value) -> bool {
        let Some(base) = self.role(HostRole::AbstractChannel) else {
            warn!("failed to set remoteAddress: channel base type unresolved");
            return false;
        };
        let Some(field) = find_field_by_name(&self.registry, base, REMOTE_ADDRESS) else {
            warn!(
                class = self.registry.type_name(base),
                "failed to set remoteAddress: no such field"
            );
            return false;
        };
        overwrite_field(&self.registry, channel, &field, address)
    }

    /// Walk from the server wrapper down to the acceptor's child bindings
    pub fn discover(&self, wrapper: &Value) -> ProbeResult<Option<ListenerTopology>> {
        let Some(internal_server) = self.locate_internal_server(wrapper) else {
            return Ok(None);
        };
        let Some(connection_manager) = self.locate_connection_manager(&internal_server) else {
            return Ok(None);
        };
        let Some(listening_channel) = self.find_server_channel(&connection_manager)? else {
            return Ok(None);
        };
        let Some(acceptor) = self.find_server_handler(&listening_channel) else {
            return Ok(None);
        };
        let children = self.acceptor_bindings(&acceptor);

        Ok(Some(ListenerTopology {
            internal_server,
            connection_manager,
            listening_channel,
            acceptor,
            children,
        }))
    }
}
