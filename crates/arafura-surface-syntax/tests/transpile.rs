//! End-to-end translation scenarios, asserted at the C-token level.

use arafura_surface_syntax::transpile;

/// Collapse whitespace so assertions compare C tokens, not layout.
fn tokens(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn c(source: &str) -> String {
    tokens(&transpile(source).expect("translation failed"))
}

#[test]
fn pointer_arithmetic_and_dereference() {
    let source = "\
x: int = 5
px: -int = W.x
v: int = px.W
px.W = 10
";
    assert_eq!(
        c(source),
        "int x = 5; int *px = &x; int v = (*px); (*px) = 10;"
    );
}

#[test]
fn typedef_struct_with_pointer_member() {
    let source = "\
@Typedef(Node)
class Node:
    data: int
    next: -Node
";
    assert_eq!(
        c(source),
        "typedef struct Node { int data; Node *next; } Node;"
    );
}

#[test]
fn c_style_for_with_two_variables() {
    let source = "\
def count() -> void:
    for (i, j) in (int, int)((i := 0, j := 10))(i < 5)((i ** W, j // W)):
        printf(\"%d %d\\n\", i, j)
";
    assert_eq!(
        c(source),
        "void count(void) { for (int i = 0, j = 10; i < 5; i++, j--) { printf(\"%d %d\\n\", i, j); } }"
    );
}

#[test]
fn c_style_for_with_one_variable() {
    let source = "\
def count() -> void:
    for i in int(i := 0)(i < 5)(i ** W):
        printf(\"%d\\n\", i)
";
    assert_eq!(
        c(source),
        "void count(void) { for (int i = 0; i < 5; i++) { printf(\"%d\\n\", i); } }"
    );
}

#[test]
fn do_while_consumes_final_continue() {
    let source = "\
def f() -> void:
    while ():
        step()
        i ** W
        if i < 10:
            continue
";
    assert_eq!(
        c(source),
        "void f(void) { do { step(); i++; } while (i < 10); }"
    );
}

#[test]
fn empty_while_without_continue_is_forever() {
    let source = "\
def f() -> void:
    while ():
        step()
        i ** W
";
    assert_eq!(c(source), "void f(void) { for (;;) { step(); i++; } }");
}

#[test]
fn while_loop() {
    let source = "\
def f(x: int) -> void:
    while x < 10:
        x += 1
";
    assert_eq!(c(source), "void f(int x) { while (x < 10) { x += 1; } }");
}

#[test]
fn preprocessor_chain() {
    let source = "\
if [DEBUG]:
    printf(\"debug\\n\")
elif [VERBOSE]:
    printf(\"verbose\\n\")
elif [QUIET]:
    printf(\"quiet\\n\")
else:
    printf(\"normal\\n\")
";
    assert_eq!(
        c(source),
        "#ifdef DEBUG printf(\"debug\\n\"); \
         #elif defined(VERBOSE) printf(\"verbose\\n\"); \
         #elif defined(QUIET) printf(\"quiet\\n\"); \
         #else printf(\"normal\\n\"); #endif"
    );
}

#[test]
fn preprocessor_negated_chain() {
    let source = "\
if [not DISABLE_LOGGING]:
    printf(\"on\\n\")
elif [not ERROR_ONLY]:
    printf(\"partial\\n\")
else:
    printf(\"off\\n\")
";
    assert_eq!(
        c(source),
        "#ifndef DISABLE_LOGGING printf(\"on\\n\"); \
         #elif !defined(ERROR_ONLY) printf(\"partial\\n\"); \
         #else printf(\"off\\n\"); #endif"
    );
}

#[test]
fn preprocessor_expression_test() {
    let source = "\
if [LEVEL > 2]:
    printf(\"chatty\\n\")
";
    assert_eq!(c(source), "#if LEVEL > 2 printf(\"chatty\\n\"); #endif");
}

#[test]
fn switch_with_fallthrough_and_default() {
    let source = "\
def test(x: int) -> void:
    match x:
        case 1:
            printf(\"one\")
            break
        case 2:
            printf(\"two or three\")
        case 3:
            printf(\"three\")
            break
        case W:
            printf(\"other\")
            break
";
    assert_eq!(
        c(source),
        "void test(int x) { switch (x) { \
         case 1: printf(\"one\"); break; \
         case 2: printf(\"two or three\"); \
         case 3: printf(\"three\"); break; \
         default: printf(\"other\"); break; } }"
    );
}

#[test]
fn includes() {
    assert_eq!(c("from stdio import *"), "#include <stdio.h>");
    assert_eq!(c("import mylib"), "#include \"mylib.h\"");
}

#[test]
fn object_macro_and_undef() {
    let source = "\
MAX: macro = 100
del MAX
";
    assert_eq!(c(source), "#define MAX 100 #undef MAX");
}

#[test]
fn function_macro_single_expression() {
    assert_eq!(
        c("def SQUARE(x):\n    x * x"),
        "#define SQUARE(x) ((x * x))"
    );
    assert_eq!(
        c("def MIN(a, b):\n    a if a < b else b"),
        "#define MIN(a, b) ((a < b ? a : b))"
    );
}

#[test]
fn variadic_macro() {
    let out = c("def LOG(fmt, *args):\n    printf(fmt, __VA_ARGS__)");
    assert_eq!(out, "#define LOG(fmt, ...) (printf(fmt, __VA_ARGS__))");
}

#[test]
fn multi_statement_macro_uses_do_while() {
    let raw = transpile("def RESET(p):\n    p.W = 0\n    count = 0").unwrap();
    assert!(raw.starts_with("#define RESET(p) do { \\\n"), "got: {}", raw);
    assert!(raw.contains("(*p) = 0; \\\n"), "got: {}", raw);
    assert!(raw.contains("count = 0; \\\n"), "got: {}", raw);
    assert!(raw.ends_with("} while (0)\n"), "got: {}", raw);
}

#[test]
fn goto_and_labels() {
    let source = "\
def f(i: int) -> void:
    LOOP: label
    if i > 10:
        raise END
    i ** W
    raise LOOP
    END: label
    printf(\"done\\n\")
";
    let raw = transpile(source).unwrap();
    assert!(raw.contains("\nLOOP:\n"), "got: {}", raw);
    assert!(raw.contains("\nEND:\n"), "got: {}", raw);
    assert_eq!(
        tokens(&raw),
        "void f(int i) { LOOP: if (i > 10) { goto END; } i++; goto LOOP; END: printf(\"done\\n\"); }"
    );
}

#[test]
fn struct_with_var_decorator() {
    let source = "\
@Var(v2, v3, v4)
class MultiVarStruct:
    value: int
";
    assert_eq!(c(source), "struct MultiVarStruct { int value; } v2, v3, v4;");
}

#[test]
fn typedef_and_var_compose() {
    let source = "\
@Typedef(Combined)
@Var(c1, c2)
class Combined:
    field: int
";
    assert_eq!(
        c(source),
        "typedef struct Combined { int field; } Combined; Combined c1, c2;"
    );
}

#[test]
fn anonymous_struct_with_var() {
    let source = "\
@Var(point_a, point_b)
class W:
    x: int
    y: int
";
    assert_eq!(c(source), "struct { int x; int y; } point_a, point_b;");
}

#[test]
fn anonymous_union_with_var() {
    let source = "\
@Var(data_u)
class W(Union):
    i: int
    f: float
";
    assert_eq!(c(source), "union { int i; float f; } data_u;");
}

#[test]
fn top_level_anonymous_enum() {
    let source = "\
@Var(global_status)
class W(Enum):
    OK = 0
    ERROR = 1
";
    assert_eq!(c(source), "enum { OK = 0, ERROR = 1, } global_status;");
}

#[test]
fn nested_anonymous_aggregates() {
    let source = "\
class Tagged:
    tag: int

    class W(Union):
        i: int
        f: float

    b: int
";
    assert_eq!(
        c(source),
        "struct Tagged { int tag; union { int i; float f; }; int b; };"
    );
}

#[test]
fn nested_anonymous_enum_member() {
    let source = "\
class Widget:
    @Var(color)
    class W(Enum):
        RED = 0
        GREEN = 1

    value: int
";
    assert_eq!(
        c(source),
        "struct Widget { enum { RED = 0, GREEN = 1, } color; int value; };"
    );
}

#[test]
fn union_and_enum_definitions() {
    let source = "\
class Data(Union):
    i: int
    f: float
    c: char

class Color(Enum):
    RED = 0
    GREEN = 1
    BLUE = 2
";
    assert_eq!(
        c(source),
        "union Data { int i; float f; char c; }; \
         enum Color { RED = 0, GREEN = 1, BLUE = 2, };"
    );
}

#[test]
fn bitfields() {
    let source = "\
class Flags:
    a: bit[unsigned[int], 3]
    b: bit[unsigned[int], 5]
    c: bit[int, 1]
";
    assert_eq!(
        c(source),
        "struct Flags { unsigned int a : 3; unsigned int b : 5; int c : 1; };"
    );
}

#[test]
fn flexible_array_member() {
    let source = "\
class Buffer:
    len: int
    data: list[char]
";
    assert_eq!(c(source), "struct Buffer { int len; char data[]; };");
}

#[test]
fn list_array_declarations() {
    let source = "\
def f() -> void:
    a: list[int, 10]
    b: list[-char, 5]
";
    assert_eq!(c(source), "void f(void) { int a[10]; char *b[5]; }");
}

#[test]
fn type_aliases() {
    let source = "\
@Typedef(Point)
class Point:
    x: int
    y: int

type PointPtr = -type[Point]
type BinaryFunc = (int, int)(int)
type Handler = -(int, int)(int)
";
    let out = c(source);
    assert!(out.contains("typedef struct Point *PointPtr;"), "got: {}", out);
    assert!(out.contains("typedef int BinaryFunc(int, int);"), "got: {}", out);
    assert!(out.contains("typedef int (*Handler)(int, int);"), "got: {}", out);
}

#[test]
fn function_taking_function_pointer() {
    let source = "\
def apply(f: -(int, int)(int), a: int, b: int) -> int:
    return f(a, b)
";
    assert_eq!(
        c(source),
        "int apply(int (*f)(int, int), int a, int b) { return f(a, b); }"
    );
}

#[test]
fn runtime_if_elif_else() {
    let source = "\
def test(x: int) -> void:
    if x > 0:
        printf(\"positive\\n\")
    elif x < 0:
        printf(\"negative\\n\")
    else:
        printf(\"zero\\n\")
";
    assert_eq!(
        c(source),
        "void test(int x) { if (x > 0) { printf(\"positive\\n\"); } \
         else if (x < 0) { printf(\"negative\\n\"); } \
         else { printf(\"zero\\n\"); } }"
    );
}

#[test]
fn designated_initialiser_annotation() {
    let source = "\
class Point:
    x: int
    y: int

q: Point(x=5, y=10)
";
    let out = c(source);
    assert!(
        out.ends_with("struct Point q = {.x = 5, .y = 10};"),
        "got: {}",
        out
    );
}

#[test]
fn struct_constructor_initialisers() {
    let source = "\
class Point:
    x: int
    y: int

p: type[Point] = Point(10, 20)
r: type[Point] = Point(x=1, y=2)
";
    let out = c(source);
    assert!(out.contains("struct Point p = {10, 20};"), "got: {}", out);
    assert!(out.contains("struct Point r = {.x = 1, .y = 2};"), "got: {}", out);
}

#[test]
fn array_initialisers() {
    let source = "\
def f() -> void:
    arr: int[5] = [1, 2, 3, 4, 5]
    matrix: int[2][3] = [[1, 2, 3], [4, 5, 6]]
    sparse: int[10] = {0: 1, 5: 6, 9: 10}
";
    assert_eq!(
        c(source),
        "void f(void) { int arr[5] = {1, 2, 3, 4, 5}; \
         int matrix[2][3] = {{1, 2, 3}, {4, 5, 6}}; \
         int sparse[10] = {[0] = 1, [5] = 6, [9] = 10}; }"
    );
}

#[test]
fn linked_list_end_to_end() {
    let source = "\
from stdio import *
from stdlib import *

MAX_SIZE: macro = 100

@Typedef(Node)
class Node:
    data: int
    next: -Node

def create_node(value: int) -> -Node:
    node: -Node = malloc(sizeof(Node))
    if node == None:
        return None
    node.W.data = value
    node.W.next = None
    return node

def main() -> int:
    head: -Node = create_node(1)
    head.W.next = create_node(2)
    return 0
";
    assert_eq!(
        c(source),
        "#include <stdio.h> #include <stdlib.h> \
         #define MAX_SIZE 100 \
         typedef struct Node { int data; Node *next; } Node; \
         Node *create_node(int value) { \
         Node *node = malloc(sizeof(Node)); \
         if (node == NULL) { return NULL; } \
         node->data = value; node->next = NULL; return node; } \
         int main(void) { \
         Node *head = create_node(1); \
         head->next = create_node(2); return 0; }"
    );
}

#[test]
fn c11_declarations() {
    let source = "\
counter: atomic[int]
ptr: -atomic[int]
aligned: alignas[16, int]
tls: static[thread_local[int]]
";
    assert_eq!(
        c(source),
        "_Atomic int counter; _Atomic int *ptr; \
         _Alignas(16) int aligned; static _Thread_local int tls;"
    );
}

#[test]
fn import_then_position_is_preserved() {
    let source = "\
import first
x: int = 1
import second
";
    assert_eq!(
        c(source),
        "#include \"first.h\" int x = 1; #include \"second.h\""
    );
}

#[test]
fn typedef_emits_exactly_once() {
    let source = "\
@Typedef(Node)
class Node:
    data: int
";
    let out = transpile(source).unwrap();
    assert_eq!(out.matches("typedef").count(), 1);
}

#[test]
fn determinism() {
    let source = "\
class Point:
    x: int

p: type[Point] = Point(x=1)
";
    assert_eq!(transpile(source).unwrap(), transpile(source).unwrap());
}
