mod cases;

test_case! {
    name: precedence,
    input: "1 + 2 * 3",
    ty: "int",
    value: Ok("7"),
}

test_case! {
    name: mixed_widening,
    input: "1 + 2.5",
    ty: "double",
    value: Ok("3.5"),
}

test_case! {
    name: long_suffix,
    input: "MaxInt + 1L",
    ty: "long",
    value: Ok("2147483648L"),
}

test_case! {
    name: integer_division_truncates,
    input: "-7 / 2",
    ty: "int",
    value: Ok("-3"),
}

test_case! {
    name: power_chain,
    input: "2 ^ 3 ^ 2",
    ty: "int",
    value: Ok("64"),
}

test_case! {
    name: complex_arithmetic,
    input: "(1 + 2i) * 2",
    ty: "complex",
    value: Ok("2.0 + 4.0i"),
}

test_case! {
    name: bit_operations,
    input: "(0xF0 | 0x0F) # 0xFF",
    ty: "int",
    value: Ok("0"),
}

test_case! {
    name: string_concatenation,
    input: "\"total: \" + 3",
    ty: "string",
    value: Ok("\"total: 3\""),
}

test_case! {
    name: division_by_zero,
    input: "1 / (2 - 2)",
    value: Err("Division by zero"),
}

test_case! {
    name: logical_short_circuit,
    input: "true && false",
    ty: "boolean",
    value: Ok("false"),
}

test_case! {
    name: sign_of_input,
    input: "(x > 0) ? 1 : -1",
    scope: [("x", "-5")],
    ty: "int",
    value: Ok("-1"),
}

test_case! {
    name: branch_widens_to_join,
    input: "x > 0 ? x : 0.5",
    scope: [("x", "2")],
    ty: "double",
    value: Ok("2.0"),
}

test_case! {
    name: undefined_identifier,
    input: "missing * 2",
    value: Err("The ID missing is undefined"),
}
