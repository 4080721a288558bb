//! Whole-class compilation tests

use std::collections::HashSet;

use jackc::{Error, compile_source};
use regex::Regex;

const SQUARE: &str = include_str!("programs/Square.jack");
const MAIN: &str = include_str!("programs/Main.jack");

/// Every line must be one instruction the VM translator accepts
fn assert_valid_vm(vm: &str) {
    let name = r"[A-Za-z_][A-Za-z0-9_]*";
    let label = r"[A-Za-z_.:][A-Za-z0-9_.:]*";
    let pattern = format!(
        r"^(push (constant|argument|local|static|this|that|pointer|temp) \d+|pop (argument|local|static|this|that|pointer|temp) \d+|add|sub|neg|eq|gt|lt|and|or|not|label {label}|goto {label}|if-goto {label}|function {name}\.{name} \d+|call {name}\.{name} \d+|return)$"
    );
    let re = Regex::new(&pattern).unwrap();

    assert!(vm.ends_with('\n'));
    for line in vm.lines() {
        assert!(re.is_match(line), "invalid VM instruction: {line:?}");
    }

    let mut labels = HashSet::new();
    for line in vm.lines().filter(|l| l.starts_with("label ")) {
        assert!(labels.insert(line), "duplicate {line:?}");
    }
}

#[test]
fn test_seven() {
    let vm = compile_source(
        "class Main {
            function void main() {
                do Output.printInt(1 + (2 * 3));
                return;
            }
        }",
    )
    .unwrap();

    assert_eq!(
        vm,
        "function Main.main 0\n\
         push constant 1\n\
         push constant 2\n\
         push constant 3\n\
         call Math.multiply 2\n\
         add\n\
         call Output.printInt 1\n\
         pop temp 0\n\
         push constant 0\n\
         return\n"
    );
}

#[test]
fn test_square_class() {
    let vm = compile_source(SQUARE).unwrap();
    assert_valid_vm(&vm);

    let functions: Vec<&str> = vm.lines().filter(|l| l.starts_with("function ")).collect();
    assert_eq!(
        functions,
        vec![
            "function Square.new 0",
            "function Square.dispose 0",
            "function Square.draw 0",
            "function Square.incSize 0",
            "function Square.erase 0",
            "function Square.total 0",
        ]
    );

    // Three fields; the static is not part of the object
    assert!(vm.starts_with(
        "function Square.new 0\n\
         push constant 3\n\
         call Memory.alloc 1\n\
         pop pointer 0\n\
         push argument 0\n\
         pop this 0\n"
    ));
    assert!(vm.contains("push static 0\npush constant 1\nadd\npop static 0\n"));
    assert!(vm.contains("push pointer 0\ncall Square.draw 1\npop temp 0\npush pointer 0\nreturn\n"));

    assert!(vm.contains(
        "function Square.dispose 0\n\
         push argument 0\n\
         pop pointer 0\n\
         push pointer 0\n\
         call Memory.deAlloc 1\n\
         pop temp 0\n\
         push constant 0\n\
         return\n"
    ));

    assert!(vm.contains(
        "push this 0\npush this 1\npush this 0\npush this 2\nadd\n\
         push this 1\npush this 2\nadd\n\
         call Screen.drawRectangle 4\n"
    ));

    assert!(vm.contains(
        "push this 1\npush this 2\nadd\npush constant 254\nlt\n\
         push this 0\npush this 2\nadd\npush constant 510\nlt\n\
         and\nnot\nif-goto ELSE1\n"
    ));

    assert!(vm.ends_with("function Square.total 0\npush static 0\nreturn\n"));
}

#[test]
fn test_main_class() {
    let vm = compile_source(MAIN).unwrap();
    assert_valid_vm(&vm);

    assert!(vm.starts_with("function Main.main 6\n"));
    // let a[i] = Keyboard.readInt(...)
    assert!(vm.contains("push local 0\npush local 2\nadd\npush constant 16\ncall String.new 1\n"));
    assert!(vm.contains(
        "call Keyboard.readInt 1\npop temp 0\npop pointer 1\npush temp 0\npop that 0\n"
    ));
    // let sum = sum + a[i]
    assert!(vm.contains(
        "push local 3\npush local 0\npush local 2\nadd\npop pointer 1\npush that 0\nadd\npop local 3\n"
    ));
    assert!(vm.contains("label WHILE1\n"));
    assert!(vm.contains("goto WHILE1\nlabel ENDWHILE1\n"));
    assert!(vm.contains("push local 3\npush local 1\ncall Math.divide 2\ncall Output.printInt 1\n"));
    assert!(vm.contains(
        "push constant 0\npush constant 0\npush constant 30\ncall Square.new 3\npop local 5\n"
    ));
    assert!(vm.contains("push local 5\ncall Square.incSize 1\npop temp 0\n"));
    assert!(vm.contains("push local 0\ncall Array.dispose 1\npop temp 0\n"));
}

#[test]
fn test_labels_unique_across_subroutines() {
    let vm = compile_source(
        "class Loops {
            function void a() { var int i; while (i) { if (i) { let i = 0; } } return; }
            function void b() { var int j; while (j) { if (j) { let j = 0; } else { } } return; }
        }",
    )
    .unwrap();
    assert_valid_vm(&vm);
    assert!(vm.contains("label WHILE2\n"));
    assert!(vm.contains("label ENDIF2\n"));
    assert!(!vm.contains("WHILE3"));
}

#[test]
fn test_errors_abort_the_class() {
    assert!(matches!(
        compile_source("class A { function void f() { let x = 1; return; } }"),
        Err(Error::UndefinedSymbol { .. })
    ));
    assert!(matches!(
        compile_source("class A { field int x; field char x; }"),
        Err(Error::DuplicateSymbol { .. })
    ));
    assert!(matches!(
        compile_source("class A { function void f() { return } }"),
        Err(Error::UnexpectedToken { .. })
    ));
    assert!(matches!(
        compile_source("class A { function void f() { let s = \"open; } }"),
        Err(Error::Lex { .. })
    ));
    assert!(matches!(
        compile_source("class A { method void f(int this) { return; } }"),
        Err(Error::UnexpectedToken { .. })
    ));
}

#[test]
fn test_error_messages() {
    let err = compile_source("class A {\n  function void f() {\n    let = 1;\n  }\n}").unwrap_err();
    assert_eq!(err.to_string(), "line 3: expected variable name, found `=`");

    let err = compile_source("class A { function void f() { do g(); return y; } }").unwrap_err();
    assert_eq!(err.to_string(), "`y` is not defined");
}

#[test]
fn test_token_listing() {
    let xml = jackc::tokenize_source("class A { field int x; }").unwrap();
    assert_eq!(
        xml,
        "<tokens>\n\
         <keyword> class </keyword>\n\
         <identifier> A </identifier>\n\
         <symbol> { </symbol>\n\
         <keyword> field </keyword>\n\
         <keyword> int </keyword>\n\
         <identifier> x </identifier>\n\
         <symbol> ; </symbol>\n\
         <symbol> } </symbol>\n\
         </tokens>\n"
    );
}

#[test]
fn test_idempotent() {
    assert_eq!(compile_source(SQUARE).unwrap(), compile_source(SQUARE).unwrap());
    assert_eq!(compile_source(MAIN).unwrap(), compile_source(MAIN).unwrap());
}
