//! End-to-end translation scenarios.
//!
//! Each test assembles a small method, translates it with the public entry
//! points and checks the shape of the resulting block graph and circuit.

mod common;

use bytecircuit::{
    analysis::EdgeKind,
    assembly::{BytecodeAssembler, Register},
    circuit::{ConstantValue, GateId, GateOp},
    metadata::{GateType, MethodBody, NoTypes, TypeSite, TypeTable},
    translate,
    utils::graph::NodeId,
    BuilderOptions, BytecodeCircuitBuilder, Error, Result, Translation,
};

fn op_of(translation: &Translation, gate: GateId) -> GateOp {
    translation
        .circuit()
        .gate(gate)
        .expect("gate exists")
        .op()
}

fn gates_of(translation: &Translation, pred: impl Fn(&GateOp) -> bool + 'static) -> Vec<GateId> {
    translation.circuit().gates_where(pred).collect()
}

fn value_inputs(translation: &Translation, gate: GateId) -> Vec<GateId> {
    translation
        .circuit()
        .gate(gate)
        .expect("gate exists")
        .value_inputs()
        .iter()
        .map(|input| input.expect("wired"))
        .collect()
}

fn state_inputs(translation: &Translation, gate: GateId) -> Vec<GateId> {
    translation
        .circuit()
        .gate(gate)
        .expect("gate exists")
        .state_inputs()
        .iter()
        .map(|input| input.expect("wired"))
        .collect()
}

/// Merge or ordinary-block gate heading `block`.
fn head_of(translation: &Translation, block: NodeId) -> GateId {
    gates_of(translation, |op| {
        matches!(op, GateOp::Merge | GateOp::OrdinaryBlock)
    })
    .into_iter()
    .find(|gate| translation.origin(*gate).map(|(b, _)| b) == Some(block))
    .expect("block has a head")
}

fn is_return(op: &GateOp) -> bool {
    matches!(op, GateOp::Return)
}

fn is_selector(op: &GateOp) -> bool {
    matches!(op, GateOp::ValueSelector)
}

#[test]
fn test_straight_line() -> Result<()> {
    let translation = translate(&common::straight_line()?)?;

    assert_eq!(translation.graph().live_block_count(), 1);
    assert!(gates_of(&translation, is_selector).is_empty());

    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 1);
    let value = value_inputs(&translation, returns[0])[0];
    assert_eq!(op_of(&translation, value), GateOp::Constant(ConstantValue::Int(1)));

    let region = &translation.graph().blocks()[0];
    assert!(region.phi_registers.is_empty());
    assert!(!region.phi_acc);
    Ok(())
}

#[test]
fn test_unprotected_operation_returns_exception_sentinel() -> Result<()> {
    let translation = translate(&common::arithmetic()?)?;
    assert_eq!(translation.graph().live_block_count(), 1);

    let add = translation.bytecode_gate(2).expect("add2 has a gate");
    let argument = translation.argument_gates()[4];
    assert_eq!(value_inputs(&translation, add), vec![argument, argument]);

    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 2);
    let values: Vec<GateId> = returns
        .iter()
        .map(|gate| value_inputs(&translation, *gate)[0])
        .collect();
    assert!(values.contains(&add));
    assert!(values
        .iter()
        .any(|gate| op_of(&translation, *gate) == GateOp::Constant(ConstantValue::Exception)));
    Ok(())
}

#[test]
fn test_conditional_reassignment_gets_one_selector() -> Result<()> {
    let translation = translate(&common::conditional_assign()?)?;
    let graph = translation.graph();
    assert_eq!(graph.live_block_count(), 3);

    let join = NodeId::new(2);
    let region = graph.block(join).expect("join block");
    assert_eq!(region.expected_preds, 2);
    assert!(region.phi_registers.contains(&0));

    let merge = head_of(&translation, join);
    assert_eq!(op_of(&translation, merge), GateOp::Merge);
    assert_eq!(state_inputs(&translation, merge).len(), 2);

    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), 1);
    let inputs: Vec<GateOp> = value_inputs(&translation, selectors[0])
        .into_iter()
        .map(|gate| op_of(&translation, gate))
        .collect();
    // The taken branch of the entry is wired first, the fall-through second.
    assert_eq!(
        inputs,
        vec![
            GateOp::Constant(ConstantValue::Int(1)),
            GateOp::Constant(ConstantValue::Int(2)),
        ]
    );
    assert_eq!(state_inputs(&translation, selectors[0]), vec![merge]);
    Ok(())
}

#[test]
fn test_if_else_selector_follows_pred_order() -> Result<()> {
    let translation = translate(&common::if_else()?)?;
    let graph = translation.graph();
    assert_eq!(graph.live_block_count(), 4);

    let join = NodeId::new(3);
    let preds: Vec<NodeId> = graph
        .block(join)
        .expect("join block")
        .expanded_preds
        .iter()
        .map(|edge| edge.block)
        .collect();
    assert_eq!(preds, vec![NodeId::new(1), NodeId::new(2)]);

    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), 1);
    let inputs: Vec<GateOp> = value_inputs(&translation, selectors[0])
        .into_iter()
        .map(|gate| op_of(&translation, gate))
        .collect();
    assert_eq!(
        inputs,
        vec![
            GateOp::Constant(ConstantValue::Int(1)),
            GateOp::Constant(ConstantValue::Int(2)),
        ]
    );
    Ok(())
}

#[test]
fn test_branch_projections_target_blocks_by_pc() -> Result<()> {
    let translation = translate(&common::if_else()?)?;
    let branch = translation.bytecode_gate(2).expect("jeqz has a gate");

    let then_head = head_of(&translation, NodeId::new(1));
    let else_head = head_of(&translation, NodeId::new(2));
    let then_input = state_inputs(&translation, then_head)[0];
    let else_input = state_inputs(&translation, else_head)[0];

    assert_eq!(op_of(&translation, else_input), GateOp::IfTrue);
    assert_eq!(op_of(&translation, then_input), GateOp::IfFalse);
    assert_eq!(state_inputs(&translation, else_input), vec![branch]);
    assert_eq!(state_inputs(&translation, then_input), vec![branch]);
    Ok(())
}

#[test]
fn test_protected_call_reaches_handler() -> Result<()> {
    let translation = translate(&common::guarded_call()?)?;
    let graph = translation.graph();

    let handler = graph.block_at(5).expect("handler block");
    let region = graph.block(handler).expect("handler region");
    assert!(region.is_catch_handler());
    assert_eq!(region.expected_preds, 1);
    assert_eq!(region.exception_edges, 1);
    assert_eq!(region.expanded_preds.len(), 1);
    assert_eq!(region.expanded_preds[0].kind, EdgeKind::Exception);
    assert_eq!(region.expanded_preds[0].pc, 2);

    let call = translation.bytecode_gate(2).expect("call has a gate");
    let head = head_of(&translation, handler);
    assert_eq!(op_of(&translation, head), GateOp::OrdinaryBlock);
    let projection = state_inputs(&translation, head)[0];
    assert_eq!(op_of(&translation, projection), GateOp::IfException);
    assert_eq!(state_inputs(&translation, projection), vec![call]);

    // Neither operation escapes the method, so no sentinel return exists.
    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 2);
    let caught = returns
        .iter()
        .map(|gate| op_of(&translation, value_inputs(&translation, *gate)[0]))
        .filter(|op| *op == GateOp::GetException)
        .count();
    assert_eq!(caught, 1);
    Ok(())
}

#[test]
fn test_handler_counts_normal_and_exception_edges() -> Result<()> {
    let translation = translate(&common::handler_with_jump()?)?;
    let graph = translation.graph();

    let handler = graph.block_at(7).expect("handler block");
    let region = graph.block(handler).expect("handler region");
    assert_eq!(region.expected_preds, 2);
    assert_eq!(region.exception_edges, 1);
    let kinds: Vec<EdgeKind> = region.expanded_preds.iter().map(|edge| edge.kind).collect();
    assert_eq!(kinds, vec![EdgeKind::Exception, EdgeKind::Normal]);

    let head = head_of(&translation, handler);
    assert_eq!(op_of(&translation, head), GateOp::Merge);

    // The exception edge brings the caught value, the jump brings the call result.
    let call = translation.bytecode_gate(2).expect("call has a gate");
    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), 1);
    let selector = selectors[0];
    assert_eq!(state_inputs(&translation, selector), vec![head]);
    let inputs = value_inputs(&translation, selector);
    assert_eq!(inputs.len(), 2);
    assert_eq!(op_of(&translation, inputs[0]), GateOp::GetException);
    assert_eq!(inputs[1], call);
    assert_eq!(graph.block(handler).expect("handler").acc_selector, Some(selector));

    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 1);
    assert_eq!(value_inputs(&translation, returns[0]), vec![selector]);
    Ok(())
}

#[test]
fn test_nested_try_uses_innermost_handler() -> Result<()> {
    let translation = translate(&common::nested_try()?)?;
    let graph = translation.graph();

    let call_block = graph.block_at(2).expect("call block");
    let inner = graph.block_at(6).expect("inner handler");
    let outer = graph.block_at(8).expect("outer handler");

    let region = graph.block(call_block).expect("call region");
    assert_eq!(region.catches, vec![inner, outer]);
    assert_eq!(region.exception_target(), Some(inner));

    let inner_region = graph.block(inner).expect("inner region");
    assert_eq!(inner_region.exception_edges, 1);
    assert_eq!(inner_region.expanded_preds[0].block, call_block);

    let outer_region = graph.block(outer).expect("outer region");
    assert_eq!(outer_region.exception_edges, 1);
    assert_eq!(outer_region.expanded_preds[0].pc, 4);
    Ok(())
}

#[test]
fn test_rethrow_leaves_through_sentinel() -> Result<()> {
    let translation = translate(&common::rethrow()?)?;
    let graph = translation.graph();
    assert_eq!(graph.live_block_count(), 2);

    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 1);
    let value = value_inputs(&translation, returns[0])[0];
    assert_eq!(op_of(&translation, value), GateOp::Constant(ConstantValue::Exception));

    // The second throw rethrows the caught value.
    let rethrow = translation.bytecode_gate(3).expect("throw has a gate");
    let thrown = value_inputs(&translation, rethrow)[0];
    assert_eq!(op_of(&translation, thrown), GateOp::GetException);
    Ok(())
}

#[test]
fn test_loop_header_dominates_body_and_merges_counter() -> Result<()> {
    let translation = translate(&common::counting_loop()?)?;
    let graph = translation.graph();
    assert_eq!(graph.live_block_count(), 4);

    let header = NodeId::new(1);
    let body = NodeId::new(2);
    let exit = NodeId::new(3);
    let region = graph.block(header).expect("header");
    assert_eq!(region.expected_preds, 2);
    assert!(region.phi_registers.contains(&0));
    assert!(region.frontier.contains(&header));
    assert_eq!(graph.block(body).expect("body").idom, Some(header));
    assert_eq!(graph.block(exit).expect("exit").idom, Some(header));

    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), 1);
    let inc = translation.bytecode_gate(16).expect("inc has a gate");
    let inputs = value_inputs(&translation, selectors[0]);
    assert_eq!(op_of(&translation, inputs[0]), GateOp::Constant(ConstantValue::Int(0)));
    assert_eq!(inputs[1], inc);

    // Header, body and exit all read the counter through the same selector.
    let less = translation.bytecode_gate(9).expect("less has a gate");
    assert_eq!(value_inputs(&translation, less)[1], selectors[0]);
    Ok(())
}

#[test]
fn test_entry_back_edge_counts_function_entry() -> Result<()> {
    let translation = translate(&common::entry_loop()?)?;
    let graph = translation.graph();

    let entry = graph.block(NodeId::new(0)).expect("entry");
    assert_eq!(entry.expected_preds, 2);
    assert_eq!(entry.expanded_preds[0].kind, EdgeKind::FunctionEntry);
    assert_eq!(entry.expanded_preds[1].kind, EdgeKind::Normal);
    assert!(entry.phi_registers.contains(&6));

    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), 1);
    let inputs = value_inputs(&translation, selectors[0]);
    assert_eq!(inputs[0], translation.argument_gates()[4]);
    assert_eq!(Some(inputs[1]), translation.bytecode_gate(2));
    Ok(())
}

#[test]
fn test_dead_code_is_pruned() -> Result<()> {
    let translation = translate(&common::dead_tail()?)?;
    let graph = translation.graph();
    assert_eq!(graph.block_count(), 2);
    assert_eq!(graph.live_block_count(), 1);
    assert!(graph.blocks()[1].dead);
    assert!(translation.bytecode_gate(8).is_none());
    Ok(())
}

#[test]
fn test_gate_origins() -> Result<()> {
    let translation = translate(&common::counting_loop()?)?;
    let inc = translation.bytecode_gate(16).expect("inc has a gate");
    assert_eq!(translation.origin(inc), Some((NodeId::new(2), 16)));

    for gate in translation.argument_gates() {
        assert_eq!(translation.origin(*gate), None);
    }
    Ok(())
}

#[test]
fn test_type_annotations_are_advisory() -> Result<()> {
    let method = common::counting_loop()?;
    let table: TypeTable = [
        (TypeSite::Bytecode { pc: 16 }, GateType::NUMBER),
        (
            TypeSite::Selector {
                block: NodeId::new(1),
                register: Register::Virtual(0),
            },
            GateType::NUMBER,
        ),
    ]
    .into_iter()
    .collect();

    let typed = BytecodeCircuitBuilder::new(&method, &table, BuilderOptions::default()).build()?;
    let untyped =
        BytecodeCircuitBuilder::new(&method, &NoTypes, BuilderOptions::default()).build()?;
    assert_eq!(typed.circuit().len(), untyped.circuit().len());

    let inc = typed.bytecode_gate(16).expect("inc has a gate");
    let gate = typed.circuit().gate(inc).expect("gate");
    assert_eq!(gate.gate_type(), Some(GateType::NUMBER));

    let selector = gates_of(&typed, is_selector)[0];
    let gate = typed.circuit().gate(selector).expect("gate");
    assert_eq!(gate.gate_type(), Some(GateType::NUMBER));

    let less = untyped.bytecode_gate(9).expect("less has a gate");
    assert_eq!(untyped.circuit().gate(less).expect("gate").gate_type(), None);
    Ok(())
}

#[test]
fn test_read_of_unwritten_register_fails() -> Result<()> {
    let mut asm = BytecodeAssembler::new();
    asm.lda(0)?.ret()?;
    let method = MethodBody::new(asm.finish()?, 1, 0);

    match translate(&method) {
        Err(Error::UndefinedRegister { register, block, .. }) => {
            assert_eq!(register, Register::Virtual(0));
            assert_eq!(block, NodeId::new(0));
        }
        other => panic!("expected an undefined register, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_long_chain_of_conditional_assignments() -> Result<()> {
    // v0 = 0; repeat { if (a) v0 = i }; return v0
    const CHAIN: usize = 1500;
    let mut asm = BytecodeAssembler::new();
    asm.ldai(0)?.sta(0)?;
    for i in 0..CHAIN {
        let skip = format!("skip{i}");
        let value = i32::try_from(i).expect("fits");
        asm.lda(6)?.jeqz(&skip)?.ldai(value)?.sta(0)?.label(&skip)?;
    }
    asm.lda(0)?.ret()?;
    let method = MethodBody::new(asm.finish()?, 2, 1);

    let translation = translate(&method)?;
    assert_eq!(translation.graph().live_block_count(), 2 * CHAIN + 1);

    // One selector per join, each chained to the previous one.
    let selectors = gates_of(&translation, is_selector);
    assert_eq!(selectors.len(), CHAIN);
    let returns = gates_of(&translation, is_return);
    assert_eq!(returns.len(), 1);
    let last = value_inputs(&translation, returns[0])[0];
    assert_eq!(op_of(&translation, last), GateOp::ValueSelector);
    translation.circuit().verify()?;
    Ok(())
}

#[test]
fn test_empty_method_is_rejected() {
    let method = MethodBody::new(Vec::new(), 0, 0);
    assert!(matches!(translate(&method), Err(Error::Empty)));
}
