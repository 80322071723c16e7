//! Shared harness for the end-to-end expression tests.
//!
//! `test_case!` parses `input`, binds the optional `scope`, and checks the
//! inferred type and the evaluated value (or the error message) against the
//! expected ones. Values are compared through their display form.

use tessera::{Engine, MapScope, Result, Type, Value};

pub fn scope(bindings: &[(&str, &str)]) -> MapScope {
    let engine = Engine::default();
    let mut scope = MapScope::new();
    for (name, source) in bindings {
        let value = engine
            .parse(source)
            .and_then(|ast| engine.evaluate(&ast, &scope))
            .unwrap_or_else(|e| panic!("cannot bind {name} = {source}: {e}"));
        scope.insert(*name, value);
    }
    scope
}

pub fn run(input: &str, scope: &MapScope) -> (Result<Type>, Result<Value>) {
    let engine = Engine::default();
    let ast = match engine.parse(input) {
        Ok(ast) => ast,
        Err(e) => return (Err(e.clone()), Err(e)),
    };
    (engine.infer(&ast, scope), engine.evaluate(&ast, scope))
}

#[macro_export]
macro_rules! test_case {
    (
        name: $name:ident,
        input: $input:expr,
        $(scope: [$(($var:expr, $src:expr)),* $(,)?],)?
        $(ty: $ty:expr,)?
        value: $value:expr $(,)?
    ) => {
        #[test]
        fn $name() {
            let scope = cases::scope(&[$($(($var, $src)),*)?]);
            let (_ty, value) = cases::run($input, &scope);
            $(
                pretty_assertions::assert_eq!(_ty.map(|t| t.to_string()), Ok($ty.to_string()));
            )?
            let value = value.map(|v| v.to_string()).map_err(|e| e.to_string());
            pretty_assertions::assert_eq!(value, $value.map(|v: &str| v.to_string()).map_err(|e: &str| e.to_string()));
        }
    };
}
