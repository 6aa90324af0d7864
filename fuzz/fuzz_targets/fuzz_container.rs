#![no_main]

//! Fuzz target for container operations
//!
//! Drives arbitrary registration, injection and resolution sequences over a
//! small identifier space so that cycles, self-references and misses are
//! common.

use arbitrary::Arbitrary;
use component_container::{Container, DiError, Factory, Options};
use libfuzzer_sys::fuzz_target;

const TYPES: [&str; 3] = ["alpha", "beta", "gamma"];
const INSTANCES: [&str; 2] = ["main", "second"];

#[derive(Debug, Arbitrary)]
struct Id {
    ty: u8,
    instance: Option<u8>,
}

impl Id {
    fn render(&self) -> String {
        let ty = TYPES[self.ty as usize % TYPES.len()];
        match self.instance {
            Some(i) => format!("{ty}:{}", INSTANCES[i as usize % INSTANCES.len()]),
            None => ty.to_string(),
        }
    }
}

#[derive(Debug, Arbitrary)]
enum Kind {
    Constructor,
    Extendable,
    Create,
}

#[derive(Debug, Arbitrary)]
enum ContainerOp {
    Register {
        id: Id,
        kind: Kind,
        singleton: Option<bool>,
        instantiate: Option<bool>,
    },
    Inject {
        id: Id,
        slot: u8,
        target: Id,
    },
    InjectConstructor {
        id: Id,
        position: u8,
        target: Id,
    },
    TypeOptions {
        ty: Id,
        singleton: Option<bool>,
        instantiate: Option<bool>,
    },
    Resolve(Id),
    FactoryFor(Id),
}

fn factory(kind: &Kind) -> Factory {
    match kind {
        Kind::Constructor => Factory::constructor(|props, args| props.len() + args.len()),
        Kind::Extendable => Factory::extendable(|props, args| props.len() + args.len()),
        Kind::Create => Factory::with_create(|props| props.len()),
    }
}

fn options(singleton: Option<bool>, instantiate: Option<bool>) -> Options {
    Options {
        singleton,
        instantiate,
        ..Options::default()
    }
}

fuzz_target!(|ops: Vec<ContainerOp>| {
    let container = Container::new();

    for op in ops {
        match op {
            ContainerOp::Register {
                id,
                kind,
                singleton,
                instantiate,
            } => {
                let id = id.render();
                container.register_with(&id, factory(&kind), options(singleton, instantiate));
                assert!(container.contains(&id));
            }
            ContainerOp::Inject { id, slot, target } => {
                container.inject(&id.render(), &format!("slot{}", slot % 4), &target.render());
            }
            ContainerOp::InjectConstructor {
                id,
                position,
                target,
            } => {
                container.inject_constructor(&id.render(), position as usize, &target.render());
            }
            ContainerOp::TypeOptions {
                ty,
                singleton,
                instantiate,
            } => {
                let name = ty.render();
                let result = container.options_for_type(&name, options(singleton, instantiate));
                assert_eq!(result.is_ok(), !name.contains(':'));
            }
            ContainerOp::Resolve(id) => {
                let id = id.render();
                match container.resolve(&id) {
                    Ok(Some(first)) => {
                        // Singletons must come back identical
                        if container.effective_options(&id).is_singleton() {
                            if let Ok(Some(second)) = container.resolve(&id) {
                                assert!(first.ptr_eq(&second));
                            }
                        }
                    }
                    Ok(None) => assert!(!container.contains(&id)),
                    Err(DiError::UnknownInjection { .. }) | Err(DiError::CircularDependency { .. }) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            ContainerOp::FactoryFor(id) => {
                let _ = container.factory_for(&id.render());
            }
        }
    }
});
