mod cases;

test_case! {
    name: closure_call,
    input: "(function(x:int) x * 2)(21)",
    ty: "int",
    value: Ok("42"),
}

test_case! {
    name: closure_from_scope,
    input: "square(4)",
    scope: [("square", "function(x) x * x")],
    value: Ok("16"),
}

test_case! {
    name: closure_captures_definition_scope,
    input: "addBase(1)",
    scope: [("base", "10"), ("addBase", "function(x) x + base")],
    value: Ok("11"),
}

test_case! {
    name: closure_arity_mismatch,
    input: "(function(a, b) a + b)(1)",
    value: Err("Type error: function expects 2 arguments, got 1"),
}

test_case! {
    name: fold_sums,
    input: "fold(function(acc:int, x:int) acc + x, 0, [1, 2, 3, 4])",
    ty: "int",
    value: Ok("10"),
}

test_case! {
    name: cast_widens,
    input: "cast(double, 3)",
    ty: "double",
    value: Ok("3.0"),
}

test_case! {
    name: eval_nested_source,
    input: "eval(\"x * 10\")",
    scope: [("x", "4")],
    ty: "int",
    value: Ok("40"),
}

test_case! {
    name: object_reference,
    input: "object(\"Sensor\")",
    ty: "object(\"Sensor\")",
    value: Ok("object(\"Sensor\")"),
}

test_case! {
    name: external_without_engine,
    input: "external(\"x + 1\", x)",
    scope: [("x", "1")],
    value: Err("External engine: no external engine is configured"),
}

test_case! {
    name: string_methods,
    input: "\"  Tessera \".trim().toUpperCase()",
    ty: "string",
    value: Ok("\"TESSERA\""),
}

test_case! {
    name: record_field,
    input: "{name = \"probe\", gain = 2.5}.gain * 2",
    ty: "double",
    value: Ok("5.0"),
}

test_case! {
    name: union_alternative,
    input: "{|ok = 3|}.ok + 1",
    ty: "int",
    value: Ok("4"),
}

test_case! {
    name: unknown_function,
    input: "frobnicate(1)",
    value: Err("No operation found matching frobnicate(int)"),
}
