//! Mock host shared by the integration tests
//!
//! Builds a small server graph with the class names a real host carries:
//! wrapper -> internal server -> connection manager -> bind results ->
//! listening channel -> pipeline -> acceptor.

#![allow(dead_code)]

use std::sync::Arc;

use hostprobe_engine::reflect::find_field_by_name;
use hostprobe_engine::{
    builtin, ClassBuilder, ClassId, ClassRegistry, HostError, HostResult, MethodDecl, ObjectRef,
    Value, Visibility,
};

pub const ACCEPTOR: &str = "io.netty.bootstrap.ServerBootstrap$ServerBootstrapAcceptor";
pub const PIPELINE: &str = "io.netty.channel.DefaultChannelPipeline";
pub const ABSTRACT_CHANNEL: &str = "io.netty.channel.AbstractChannel";
pub const SERVER_CHANNEL: &str = "io.netty.channel.ServerChannel";
pub const NIO_SERVER_CHANNEL: &str = "io.netty.channel.socket.nio.NioServerSocketChannel";
pub const NIO_CHANNEL: &str = "io.netty.channel.socket.nio.NioSocketChannel";
pub const CHANNEL_FUTURE: &str = "io.netty.channel.ChannelFuture";
pub const CHANNEL_PROMISE: &str = "io.netty.channel.DefaultChannelPromise";
pub const CONNECTION_MANAGER: &str = "net.minecraft.server.network.ServerConnection";
pub const INTERNAL_SERVER: &str = "net.minecraft.server.MinecraftServer";
pub const DEDICATED_SERVER: &str = "net.minecraft.server.dedicated.DedicatedServer";
pub const SERVER_WRAPPER: &str = "org.bukkit.craftbukkit.v1_19_R1.CraftServer";

/// Knobs for host drift between releases
#[derive(Debug, Clone)]
pub struct HostShape {
    pub wrapper_name: &'static str,
    pub connection_field: &'static str,
    pub with_get_server: bool,
    pub get_server_foreign: bool,
    pub with_get_connection: bool,
    pub with_child_attrs: bool,
    pub bind_succeeded: bool,
}

impl Default for HostShape {
    fn default() -> Self {
        Self {
            wrapper_name: SERVER_WRAPPER,
            connection_field: "connection",
            with_get_server: true,
            get_server_foreign: false,
            with_get_connection: true,
            with_child_attrs: true,
            bind_succeeded: true,
        }
    }
}

/// A fully wired mock host
pub struct MockHost {
    pub registry: Arc<ClassRegistry>,
    pub wrapper: Value,
    pub internal_server: Value,
    pub connection_manager: Value,
    pub listening_channel: Value,
    pub acceptor: Value,
    pub child_handler: Value,
    pub child_options: Value,
    pub child_attrs: Value,
    pub accepted_channel: Value,
}

/// Read a field by name from inside a method body
fn read(registry: &ClassRegistry, this: &ObjectRef, name: &str) -> HostResult<Value> {
    let field = find_field_by_name(registry, this.class_id(), name).ok_or_else(|| {
        HostError::Invocation {
            method: name.to_string(),
            reason: "field missing".to_string(),
        }
    })?;
    field.accessible().get(registry, &Value::Object(this.clone()))
}

fn getter(method: &'static str, field: &'static str) -> MethodDecl {
    MethodDecl::new(method, move |registry, this, _| read(registry, this, field))
}

/// Store `value` into field `name` of `instance`, bypassing visibility
pub fn put(registry: &ClassRegistry, instance: &Value, name: &str, value: Value) {
    let class_id = instance.runtime_class().unwrap();
    find_field_by_name(registry, class_id, name)
        .unwrap()
        .accessible()
        .set(registry, instance, value)
        .unwrap();
}

/// Read field `name` of `instance`, bypassing visibility
pub fn peek(registry: &ClassRegistry, instance: &Value, name: &str) -> Value {
    let class_id = instance.runtime_class().unwrap();
    find_field_by_name(registry, class_id, name)
        .unwrap()
        .accessible()
        .get(registry, instance)
        .unwrap()
}

fn new(registry: &ClassRegistry, class_id: ClassId) -> Value {
    Value::Object(registry.new_object(class_id).unwrap())
}

pub fn build(shape: HostShape) -> MockHost {
    let mut registry = hostprobe_engine::create_standard_registry();

    // Netty
    let handler = registry
        .define(ClassBuilder::new("io.netty.channel.ChannelInitializer"))
        .unwrap();
    let map = registry.define(ClassBuilder::new("util.LinkedHashMap")).unwrap();
    let attrs = registry.define(ClassBuilder::new("util.Map$Entry[]")).unwrap();

    let mut acceptor_builder = ClassBuilder::new(ACCEPTOR)
        .field("childGroup", builtin::OBJECT, Visibility::Private)
        .field("childHandler", builtin::OBJECT, Visibility::Private)
        .field("childOptions", map, Visibility::Private);
    if shape.with_child_attrs {
        acceptor_builder = acceptor_builder.field("childAttrs", attrs, Visibility::Private);
    }
    let acceptor = registry.define(acceptor_builder).unwrap();

    let pipeline = registry
        .define(
            ClassBuilder::new(PIPELINE)
                .field("acceptor", builtin::OBJECT, Visibility::Private)
                .method(
                    MethodDecl::new("get", |registry, this, args| {
                        if args[0].as_str() == Some(ACCEPTOR) {
                            read(registry, this, "acceptor")
                        } else {
                            Ok(Value::Null)
                        }
                    })
                    .params(&[builtin::STRING])
                    .returns(builtin::OBJECT),
                ),
        )
        .unwrap();

    let abstract_channel = registry
        .define(
            ClassBuilder::new(ABSTRACT_CHANNEL)
                .field("pipeline", pipeline, Visibility::Private)
                .field("remoteAddress", builtin::STRING, Visibility::Private)
                .method(getter("pipeline", "pipeline").returns(pipeline)),
        )
        .unwrap();
    let server_channel = registry
        .define(ClassBuilder::interface(SERVER_CHANNEL))
        .unwrap();
    let nio_server_channel = registry
        .define(
            ClassBuilder::new(NIO_SERVER_CHANNEL)
                .extends(abstract_channel)
                .implements(server_channel),
        )
        .unwrap();
    let nio_channel = registry
        .define(ClassBuilder::new(NIO_CHANNEL).extends(abstract_channel))
        .unwrap();

    let future = registry
        .define(ClassBuilder::interface(CHANNEL_FUTURE))
        .unwrap();
    let promise = registry
        .define(
            ClassBuilder::new(CHANNEL_PROMISE)
                .implements(future)
                .field("channel", builtin::OBJECT, Visibility::Private)
                .field("success", builtin::BOOLEAN, Visibility::Private)
                .method(getter("isSuccess", "success").returns(builtin::BOOLEAN))
                .method(getter("channel", "channel").returns(builtin::OBJECT)),
        )
        .unwrap();

    // Minecraft
    let manager = registry
        .define(
            ClassBuilder::new(CONNECTION_MANAGER)
                .field("running", builtin::BOOLEAN, Visibility::Public)
                .field("pending", builtin::LIST, Visibility::Private)
                .field("channels", builtin::LIST, Visibility::Private)
                .field("connections", builtin::LIST, Visibility::Private),
        )
        .unwrap();

    let mut internal_builder = ClassBuilder::new(INTERNAL_SERVER)
        .field("tickCount", builtin::INTEGER, Visibility::Public)
        .field(shape.connection_field, manager, Visibility::Private);
    if shape.with_get_connection {
        internal_builder = internal_builder
            .method(getter("getConnection", shape.connection_field).returns(manager));
    }
    let internal = registry.define(internal_builder).unwrap();
    let dedicated = registry
        .define(ClassBuilder::new(DEDICATED_SERVER).extends(internal))
        .unwrap();

    // Bukkit
    let mut wrapper_builder = ClassBuilder::new(shape.wrapper_name)
        .field("console", dedicated, Visibility::Protected);
    if shape.get_server_foreign {
        // Newer wrappers return themselves from getServer.
        wrapper_builder = wrapper_builder.method(
            MethodDecl::new("getServer", |_, this, _| Ok(Value::Object(this.clone())))
                .returns(builtin::OBJECT),
        );
    } else if shape.with_get_server {
        wrapper_builder =
            wrapper_builder.method(getter("getServer", "console").returns(dedicated));
    }
    let wrapper = registry.define(wrapper_builder).unwrap();

    // Instances
    let acceptor_obj = new(&registry, acceptor);
    let child_handler = new(&registry, handler);
    let child_options = new(&registry, map);
    let child_attrs = new(&registry, attrs);
    put(&registry, &acceptor_obj, "childHandler", child_handler.clone());
    put(&registry, &acceptor_obj, "childOptions", child_options.clone());
    if shape.with_child_attrs {
        put(&registry, &acceptor_obj, "childAttrs", child_attrs.clone());
    }

    let pipeline_obj = new(&registry, pipeline);
    put(&registry, &pipeline_obj, "acceptor", acceptor_obj.clone());

    let listening_channel = new(&registry, nio_server_channel);
    put(&registry, &listening_channel, "pipeline", pipeline_obj);

    let accepted_channel = new(&registry, nio_channel);
    put(&registry, &accepted_channel, "remoteAddress", Value::string("127.0.0.1:40000"));

    let promise_obj = new(&registry, promise);
    put(&registry, &promise_obj, "channel", listening_channel.clone());
    put(&registry, &promise_obj, "success", Value::Bool(shape.bind_succeeded));

    let manager_obj = new(&registry, manager);
    put(&registry, &manager_obj, "running", Value::Bool(true));
    put(&registry, &manager_obj, "pending", Value::List(registry.new_list(Vec::new())));
    put(&registry, &manager_obj, "channels", Value::List(registry.new_list(vec![promise_obj])));
    put(
        &registry,
        &manager_obj,
        "connections",
        Value::List(registry.new_list(vec![accepted_channel.clone()])),
    );

    let internal_server = new(&registry, dedicated);
    put(&registry, &internal_server, "tickCount", Value::Int(0));
    put(
        &registry,
        &internal_server,
        shape.connection_field,
        manager_obj.clone(),
    );

    let wrapper_obj = new(&registry, wrapper);
    put(&registry, &wrapper_obj, "console", internal_server.clone());

    MockHost {
        registry: Arc::new(registry),
        wrapper: wrapper_obj,
        internal_server,
        connection_manager: manager_obj,
        listening_channel,
        acceptor: acceptor_obj,
        child_handler,
        child_options,
        child_attrs,
        accepted_channel,
    }
}
