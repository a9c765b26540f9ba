use pretty_assertions::assert_eq;

use weft::{CompiledTemplate, Compiler, Delims, ErrorKind, Op, Operand, Span, WarningKind};

#[test]
fn compile_empty() {
    let t = weft::compile("").unwrap();
    assert!(t.code().is_empty());
    assert!(t.strings().is_empty());
    assert!(t.subtemplates().is_empty());
    assert!(t.warnings().is_empty());
    assert_eq!(t.span(), Span::new(0, 0));
}

#[test]
fn compile_literal_only() {
    let t = weft::compile("lorem ipsum").unwrap();
    assert_eq!(t.code(), [Op::LoadStr as u8, 0, 0, Op::Write as u8]);
    assert_eq!(t.strings(), ["lorem ipsum"]);
    assert_eq!(t.source(), "lorem ipsum");
}

#[test]
fn compile_attr_between_literals() {
    let t = weft::compile("Hello <name>!").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadStr as u8, 0, 0,
            Op::Write as u8,
            Op::LoadAttr as u8, 0, 1,
            Op::Write as u8,
            Op::LoadStr as u8, 0, 2,
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["Hello ", "name", "!"]);
    assert_eq!(t.code_size(), 12);
}

#[test]
fn compile_multiline_literals_kept_verbatim() {
    let t = weft::compile("a\n<b>\nc").unwrap();
    assert_eq!(t.strings(), ["a\n", "b", "\nc"]);
}

#[test]
fn compile_predefined_attrs_load_local() {
    let t = weft::compile("<i>, <i0>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadLocal as u8, 0, 0,
            Op::Write as u8,
            Op::LoadStr as u8, 0, 1,
            Op::Write as u8,
            Op::LoadLocal as u8, 0, 2,
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["i", ", ", "i0"]);
}

#[test]
fn compile_property_chain() {
    let t = weft::compile("<user.name>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::LoadProp as u8, 0, 1,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_indirect_property() {
    let t = weft::compile("<user.(k)>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::LoadAttr as u8, 0, 1,
            Op::LoadPropInd as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_string_literal_dedup() {
    let t = weft::compile(r#"<"hi"> and <"hi">"#).unwrap();
    assert_eq!(t.strings(), ["hi", " and "]);
    assert_eq!(
        t.code(),
        [
            Op::LoadStr as u8, 0, 0,
            Op::Write as u8,
            Op::LoadStr as u8, 0, 1,
            Op::Write as u8,
            Op::LoadStr as u8, 0, 0,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_instantiation() {
    let t = weft::compile("<box()>").unwrap();
    assert_eq!(t.code(), [Op::New as u8, 0, 0, Op::Write as u8]);

    let t = weft::compile("<box(x)>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::New as u8, 0, 0,
            Op::LoadAttr as u8, 0, 1,
            Op::StoreSoleArg as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_instantiation_named_and_pass_through_args() {
    let t = weft::compile("<box(w=a, ...)>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::New as u8, 0, 0,
            Op::LoadAttr as u8, 0, 1,
            Op::StoreAttr as u8, 0, 2,
            Op::SetPassThru as u8,
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["box", "a", "w"]);
}

#[test]
fn compile_indirect_instantiation() {
    let t = weft::compile("<(t)()>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::ToStr as u8,
            Op::NewInd as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_function_calls() {
    let t = weft::compile("<first(items)>").unwrap();
    assert_eq!(
        t.code(),
        [Op::LoadAttr as u8, 0, 0, Op::First as u8, Op::Write as u8]
    );

    let t = weft::compile("<trim(first(items))>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::First as u8,
            Op::Trim as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_list() {
    let t = weft::compile("<[a, b]>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::List as u8,
            Op::LoadAttr as u8, 0, 0,
            Op::Add as u8,
            Op::LoadAttr as u8, 0, 1,
            Op::Add as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_map() {
    let t = weft::compile("<names:bold()>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::New as u8, 0, 1,
            Op::Map as u8,
            Op::Write as u8,
        ]
    );
}

#[test]
fn compile_alternating_map() {
    let t = weft::compile("<rows:odd(),even()>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::New as u8, 0, 1,
            Op::New as u8, 0, 2,
            Op::RotMap as u8, 0, 2,
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["rows", "odd", "even"]);
}

#[test]
fn compile_if_else() {
    let t = weft::compile("<if(x)>yes<else>no<endif>").unwrap();
    assert_eq!(
        t.disassemble(),
        "\
0000: load_attr #0 \"x\"
0003: brf @13
0006: load_str #1 \"yes\"
0009: write
0010: br @17
0013: load_str #2 \"no\"
0016: write
"
    );
    assert_patched(&t);
}

#[test]
fn compile_elseif_chain() {
    let t = weft::compile("<if(a)>1<elseif(b)>2<else>3<endif>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,   // a
            Op::Brf as u8, 0, 13,       // over clause 1
            Op::LoadStr as u8, 0, 1,    // "1"
            Op::Write as u8,
            Op::Br as u8, 0, 30,        // to end
            Op::LoadAttr as u8, 0, 2,   // b
            Op::Brf as u8, 0, 26,       // over clause 2
            Op::LoadStr as u8, 0, 3,    // "2"
            Op::Write as u8,
            Op::Br as u8, 0, 30,        // to end
            Op::LoadStr as u8, 0, 4,    // "3"
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["a", "1", "b", "2", "3"]);
    assert_patched(&t);
}

#[test]
fn compile_nested_if() {
    let t = weft::compile("<if(a)><if(b)>x<endif><endif>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::Brf as u8, 0, 16,
            Op::LoadAttr as u8, 0, 1,
            Op::Brf as u8, 0, 16,
            Op::LoadStr as u8, 0, 2,
            Op::Write as u8,
        ]
    );
    assert_patched(&t);
}

#[test]
fn compile_negated_conditions() {
    let t = weft::compile("<if(!a)>x<elseif(!b)>y<endif>").unwrap();
    assert_eq!(t.code()[3], Op::Brt as u8);
    assert_eq!(t.code()[16], Op::Brt as u8);
    assert_patched(&t);
}

#[test]
fn compile_subtemplate() {
    let t = weft::compile("<items:{it|<it>}>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::New as u8, 0, 1,
            Op::Map as u8,
            Op::Write as u8,
        ]
    );
    assert_eq!(t.strings(), ["items", "_sub1"]);

    assert_eq!(t.subtemplates().len(), 1);
    let sub = &t.subtemplates()[0];
    assert_eq!(sub.name(), Some("_sub1"));
    assert_eq!(sub.formal_args().len(), 1);
    assert_eq!(sub.formal_args()[0].name, "it");
    assert_eq!(sub.source(), "<it>");
    assert_eq!(sub.span(), Span::new(11, 15));
    assert_eq!(sub.enclosing_expr(), Some(Span::new(1, 16)));
    // "it" is not a predefined local
    assert_eq!(sub.code(), [Op::LoadAttr as u8, 0, 0, Op::Write as u8]);
    assert_eq!(sub.strings(), ["it"]);
}

#[test]
fn compile_subtemplate_body_trimmed() {
    let t = weft::compile("<items:{ it |  <it> }>").unwrap();
    let sub = &t.subtemplates()[0];
    assert_eq!(sub.formal_args()[0].name, "it");
    assert_eq!(sub.source(), "<it>");
}

#[test]
fn compile_subtemplate_without_args() {
    let t = weft::compile("<items:{...}>").unwrap();
    let sub = &t.subtemplates()[0];
    assert!(sub.formal_args().is_empty());
    assert_eq!(sub.source(), "...");
}

#[test]
fn compile_subtemplate_two_args_records_none() {
    // only one formal argument is supported; the clause stays in the body
    let t = weft::compile("<items:{x,y|b}>").unwrap();
    let sub = &t.subtemplates()[0];
    assert!(sub.formal_args().is_empty());
    assert_eq!(sub.source(), "x,y|b");
}

#[test]
fn compile_subtemplates_named_in_occurrence_order() {
    let t = weft::compile("<a:{x|1}><b:{y|2}>").unwrap();
    let names: Vec<_> = t.subtemplates().iter().map(|s| s.name().unwrap()).collect();
    assert_eq!(names, ["_sub1", "_sub2"]);
    assert_eq!(t.subtemplates()[0].formal_args()[0].name, "x");
    assert_eq!(t.subtemplates()[1].formal_args()[0].name, "y");
}

#[test]
fn compile_nested_subtemplates() {
    let t = weft::compile("<a:{x|<b:{y|<y>}>}>").unwrap();
    assert_eq!(t.subtemplates().len(), 1);
    let sub1 = &t.subtemplates()[0];
    assert_eq!(sub1.name(), Some("_sub1"));
    assert_eq!(sub1.source(), "<b:{y|<y>}>");
    assert_eq!(sub1.span(), Span::new(6, 17));
    assert!(t.span().contains(sub1.span()));

    let sub2 = &sub1.subtemplates()[0];
    assert_eq!(sub2.name(), Some("_sub2"));
    assert_eq!(sub2.source(), "<y>");
    assert_eq!(sub2.span(), Span::new(12, 15));
    assert!(sub1.span().contains(sub2.span()));
    assert_eq!(sub2.enclosing_expr(), Some(Span::new(7, 16)));
}

#[test]
fn compile_subtemplate_names_monotonic_per_compiler() {
    let compiler = Compiler::new();
    let a = compiler.compile("<items:{x|1}>").unwrap();
    let b = compiler.compile("<items:{x|2}>").unwrap();
    assert_eq!(a.subtemplates()[0].name(), Some("_sub1"));
    assert_eq!(b.subtemplates()[0].name(), Some("_sub2"));
}

#[test]
fn compile_is_deterministic() {
    let source = "<if(a)>1<elseif(b)><items:{it|<it>}><else>3<endif> tail";
    let a = Compiler::new().compile(source).unwrap();
    let b = Compiler::new().compile(source).unwrap();
    assert_eq!(a.code(), b.code());
    assert_eq!(a.strings(), b.strings());
    assert_eq!(a.subtemplates().len(), b.subtemplates().len());
    assert_eq!(
        a.subtemplates()[0].name(),
        b.subtemplates()[0].name(),
    );
    assert_patched(&a);
}

#[test]
fn compile_option_with_value() {
    let t = weft::compile(r#"<names; separator=", ">"#).unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::Options as u8,
            Op::LoadStr as u8, 0, 1,
            Op::StoreOption as u8, 0, 3,
            Op::WriteOpt as u8,
        ]
    );
    assert_eq!(t.strings(), ["names", ", "]);
    assert!(t.warnings().is_empty());
}

#[test]
fn compile_option_defaults() {
    let t = weft::compile("<names; anchor>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::Options as u8,
            Op::LoadStr as u8, 0, 1,
            Op::StoreOption as u8, 0, 0,
            Op::WriteOpt as u8,
        ]
    );
    assert_eq!(t.strings(), ["names", "true"]);

    let t = weft::compile("<names; wrap>").unwrap();
    assert_eq!(t.strings(), ["names", "\n"]);
    assert!(t.warnings().is_empty());
}

#[test]
fn compile_unknown_option_skips_store() {
    let t = weft::compile(r#"<x; foo="1">"#).unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::Options as u8,
            Op::LoadStr as u8, 0, 1,
            Op::WriteOpt as u8,
        ]
    );
    assert_eq!(t.warnings().len(), 1);
    assert_eq!(
        t.warnings()[0].kind,
        WarningKind::UnknownOption("foo".to_string())
    );
    assert_eq!(t.warnings()[0].span, Span::new(1, 11));
}

#[test]
fn compile_option_without_default_warns_but_stores() {
    let t = weft::compile("<names; null>").unwrap();
    assert_eq!(
        t.code(),
        [
            Op::LoadAttr as u8, 0, 0,
            Op::Options as u8,
            Op::StoreOption as u8, 0, 2,
            Op::WriteOpt as u8,
        ]
    );
    assert_eq!(t.warnings().len(), 1);
    assert_eq!(
        t.warnings()[0].kind,
        WarningKind::NoOptionDefault("null".to_string())
    );
}

#[test]
fn compile_custom_delims() {
    let compiler = Compiler::with_delims(Delims::new('$', '$'));
    let t = compiler.compile("Hello $name$!").unwrap();
    assert_eq!(t.strings(), ["Hello ", "name", "!"]);

    // the default delimiters are plain text under custom ones
    let t = compiler.compile("a < b $x$").unwrap();
    assert_eq!(t.strings(), ["a < b ", "x"]);
}

#[test]
fn compile_err_unbalanced_delims() {
    let err = weft::compile("Hello <oops").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnbalancedDelims);
    assert_eq!(
        format!("{err}"),
        "unclosed expression between bytes 6 and 7"
    );
}

#[test]
fn compile_err_syntax() {
    let err = weft::compile("x <a b> y").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        format!("{err:#}"),
        "
   |
 1 | x <a b> y
   |      ^ expected end of expression, found an identifier
"
    );
}

#[test]
fn compile_err_unclosed_if() {
    let err = weft::compile("<if(x)>y").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(format!("{err}"), "unclosed `if` between bytes 1 and 6");
}

#[test]
fn compile_err_mismatched_endif() {
    let err = weft::compile("a<endif>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(
        format!("{err}"),
        "`endif` with no open `if` between bytes 2 and 7"
    );
}

#[test]
fn compile_err_inside_subtemplate() {
    let err = weft::compile("<a:{x|<if(y)>z}>").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Syntax);
    assert_eq!(format!("{err}"), "unclosed `if` between bytes 1 and 6");
}

// Walks the instructions checking that no branch operand still holds the
// placeholder and every target is in range.
fn assert_patched(template: &CompiledTemplate) {
    let code = template.code();
    let mut ip = 0;
    while ip < code.len() {
        let op = Op::from_byte(code[ip]).expect("undefined opcode");
        if op.operand() == Operand::Addr {
            let target = u16::from_be_bytes([code[ip + 1], code[ip + 2]]);
            assert_ne!(target, u16::MAX, "unpatched placeholder at {ip}");
            assert!((target as usize) <= code.len(), "target out of range at {ip}");
        }
        ip += op.width();
    }
    for sub in template.subtemplates() {
        assert_patched(sub);
    }
}
