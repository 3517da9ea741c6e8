//! End-to-end scenarios: source text through the compiler, the gamefile,
//! and the virtual machine.

use quoll_common::{TypeTag, Value};
use quoll_run::{OptionKind, Vm};

const PREAMBLE: &str = "declare TITLE \"Test Game\";\n\
                        declare AUTHOR \"Tester\";\n\
                        declare VERSION 1;\n\
                        declare GAMEID \"TEST-GAME\";\n";

fn boot(body: &str) -> Vm {
    quollvm::init_logging();
    let source = format!("{}{}", PREAMBLE, body);
    quollvm::boot(&[("game.src", &source)]).expect("game should build")
}

#[test]
fn hello_world_prints_and_ends() {
    let mut vm = boot("function main() { (print \"hi\") }");
    let kind = vm.start().unwrap();
    assert_eq!(kind, OptionKind::EndOfProgram);
    assert_eq!(vm.text_buffer, "hi");
}

#[test]
fn bare_string_statement_prints_itself() {
    let mut vm = boot("function main() { (\"hello there\") }");
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "hello there");
}

#[test]
fn fibonacci_recurses_to_55() {
    let mut vm = boot(
        "function fib(n) {\n\
             (if (lte *n 1) *n (add (fib (sub *n 1)) (fib (sub *n 2))))\n\
         }\n\
         function main() { (print (fib 10)) }",
    );
    let kind = vm.start().unwrap();
    assert_eq!(kind, OptionKind::EndOfProgram);
    assert_eq!(vm.text_buffer, "55");
}

#[test]
fn control_flow_returns_branch_values() {
    let mut vm = boot(
        "function pick(c) { (if *c 10 20) }\n\
         function main() { (print (pick 1) \":\" (pick 0)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "10:20");
}

#[test]
fn and_short_circuits_after_first_false() {
    let mut vm = boot(
        "function side(x) { (proc (print \"S\") *x) }\n\
         function main() { (print (and (side 1) (side 0) (side 1))) }",
    );
    vm.start().unwrap();
    // the third operand is never evaluated
    assert_eq!(vm.text_buffer, "SS0");
}

#[test]
fn or_short_circuits_after_first_true() {
    let mut vm = boot(
        "function side(x) { (proc (print \"S\") *x) }\n\
         function main() { (print (or (side 0) (side 1) (side 1))) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "SS1");
}

#[test]
fn locals_store_and_print() {
    let mut vm = boot("function main() { [ x ] (set *x 5) (print *x) }");
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "5");
}

#[test]
fn locals_participate_in_arithmetic() {
    let mut vm = boot(
        "function main() { [ x y ] (set *x 5) (set *y 7) (print (add *x *y)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "12");
}

#[test]
fn while_loop_counts() {
    let mut vm = boot(
        "function main() { [ i ]\n\
             (set *i 0)\n\
             (while (lt *i 3) (proc (print *i) (set *i (add *i 1))))\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "012");
}

#[test]
fn do_while_runs_body_first() {
    let mut vm = boot(
        "function main() { [ i ]\n\
             (set *i 9)\n\
             (do_while (proc (print *i) (set *i (add *i 1))) (lt *i 3))\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "9");
}

#[test]
fn break_leaves_the_loop() {
    let mut vm = boot(
        "function main() { [ i ]\n\
             (set *i 0)\n\
             (while 1 (proc\n\
                 (if (eq *i 2) (break) 0)\n\
                 (print *i)\n\
                 (set *i (add *i 1))))\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "01");
}

#[test]
fn get_option_suspends_and_resume_continues_in_caller() {
    let mut vm = boot(
        "function menuFilter(option) { }\n\
         function menu() {\n\
             (add_option \"Go north\" 1 none none)\n\
             (get_option menuFilter)\n\
         }\n\
         function main() { (print \"picked \" (menu)) }",
    );
    let kind = vm.start().unwrap();
    assert_eq!(kind, OptionKind::Choice);
    assert_eq!(vm.option_type, OptionKind::Choice);
    // the text printed before the suspension belongs to this turn
    assert_eq!(vm.text_buffer, "picked ");
    assert_eq!(vm.options.len(), 1);
    let shown = vm.game.string(vm.options[0].text as i32).unwrap();
    assert_eq!(shown.text, "Go north");
    assert_eq!(vm.options[0].value, Value::integer(1));

    // the host answers; execution continues inside main with a fresh
    // text buffer for the new turn
    let kind = vm.resume(Some(Value::integer(42))).unwrap();
    assert_eq!(kind, OptionKind::EndOfProgram);
    assert_eq!(vm.text_buffer, "42");
}

#[test]
fn get_line_sets_the_input_kind() {
    let mut vm = boot(
        "function ask() { (get_line) }\n\
         function main() { (print (ask)) }",
    );
    let kind = vm.start().unwrap();
    assert_eq!(kind, OptionKind::Line);
}

#[test]
fn division_by_zero_reports_main_in_the_trace() {
    let mut vm = boot("function main() { (div 5 0) }");
    let err = vm.start().unwrap_err();
    assert_eq!(err.error, quoll_run::VmError::DivisionByZero);
    assert_eq!(err.trace[0].name.as_deref(), Some("main"));
    assert!(err.trace[0].ip > 0);
    let report = err.report();
    assert!(report.contains("RUNTIME ERROR"));
    assert!(report.contains("main"));
}

#[test]
fn extended_lists_report_their_new_size() {
    let mut vm = boot(
        "declare stuff [ 1 2 3 ];\n\
         extend stuff [ 4 5 ];\n\
         function main() { (print (get_size stuff)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "5");
}

#[test]
fn list_items_read_back_through_get() {
    let mut vm = boot(
        "declare stuff [ 10 20 30 ];\n\
         function main() { (print (get stuff 1)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "20");
}

#[test]
fn maps_look_up_by_key() {
    let mut vm = boot(
        "declare table { 1 : \"one\" 2 : \"two\" };\n\
         function main() { (print (get table 2)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "two");
}

#[test]
fn object_properties_resolve_through_symbols() {
    let mut vm = boot(
        "object lamp $weight 12;\n\
         function main() { (print (get lamp $weight)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "12");
}

#[test]
fn property_methods_see_self() {
    let mut vm = boot(
        "object lamp $describe function() { (print (get_size \"xx\")) (say (typeof *self)) };\n\
         function main() { ((get lamp $describe)) }",
    );
    vm.start().unwrap();
    // typeof self is the Object tag
    assert_eq!(vm.text_buffer, format!("2{}", TypeTag::Object as u8));
}

#[test]
fn flagsets_collapse_to_integers() {
    let mut vm = boot(
        "declare LOCKED 1;\n\
         declare HIDDEN 4;\n\
         declare state flags(LOCKED HIDDEN);\n\
         function main() { (print state) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "5");
}

#[test]
fn vocab_words_sort_and_print() {
    let mut vm = boot(
        "declare words [ @zebra @apple ];\n\
         function main() { (print (get words 1) \" \" (get words 0)) }",
    );
    vm.start().unwrap();
    // sorted vocab: apple before zebra; items keep declaration order
    assert_eq!(vm.text_buffer, "apple zebra");
}

#[test]
fn print_uf_uppercases_only_the_first_argument() {
    let mut vm = boot("function main() { (print_uf \"hello\" \" world\") }");
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "Hello world");
}

#[test]
fn settings_feed_the_info_strip() {
    let mut vm = boot(
        "function main() {\n\
             (set_setting infobarTitle \"The Test\")\n\
             (set_setting infobarLeft \"left\")\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.info_text[quoll_run::vm::INFO_TITLE], "The Test");
    assert_eq!(vm.info_text[quoll_run::vm::INFO_LEFT], "left");
}

#[test]
fn save_files_round_trip_through_the_store() {
    let mut vm = boot(
        "function main() { [ data ]\n\
             (set *data (new List))\n\
             (list_push *data 42)\n\
             (list_push *data 7)\n\
             (print (file_write \"slot1\" *data) \" \")\n\
             (print (get (file_read \"slot1\") 1))\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "1 7");
    let names: Vec<String> = vm
        .store()
        .list("TEST-GAME")
        .into_iter()
        .map(|r| r.name)
        .collect();
    assert_eq!(names, vec!["slot1"]);
}

#[test]
fn error_opcode_carries_its_message() {
    let mut vm = boot("function main() { (error \"boom\") }");
    let err = vm.start().unwrap_err();
    assert_eq!(err.error, quoll_run::VmError::Game("boom".to_string()));
}

#[test]
fn asm_functions_execute_raw_opcodes() {
    let mut vm = boot(
        "asm_function double(n) { n n add return }\n\
         function main() { (print (double 21)) }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "42");
}

#[test]
fn multiline_strings_fold_cleanly() {
    let mut vm = boot(
        "function main() { (print \"first line\n                        continued\") }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "first line continued");
}

#[test]
fn labels_and_raw_jumps_work_in_structured_bodies() {
    let mut vm = boot(
        "function main() { [ i ]\n\
             (set *i 0)\n\
             (label top)\n\
             (print *i)\n\
             (set *i (add *i 1))\n\
             (if (lt *i 3) (proc (jmp top) 0) 0)\n\
         }",
    );
    vm.start().unwrap();
    assert_eq!(vm.text_buffer, "012");
}

#[test]
fn next_object_walks_the_containment_tree() {
    let mut vm = boot(
        "object room;\n\
         object lamp : room;\n\
         object gem : room;\n\
         function main() { [ o ]\n\
             (set *o (next_object none))\n\
             (while (not (eq *o none)) (proc\n\
                 (print (get *o $internal_name) \" \")\n\
                 (set *o (next_object *o))))\n\
         }",
    );
    vm.start().unwrap();
    // room first, then its newest child, then that child's sibling
    assert_eq!(vm.text_buffer, "room gem lamp ");
}
