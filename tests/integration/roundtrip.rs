//! Compile/decompile round trips

use agentlab::middle::catalogue::{command_name, condition_name};
use agentlab::{compile_source, decompile, CompileResolvers, DecompileResolvers, ItemKind, ResolverSet};
use proptest::prelude::*;

fn compile(source: &str) -> Vec<u8> {
    compile_source(source, &CompileResolvers::none()).unwrap()
}

fn reprint(
    kind: ItemKind,
    source: &str,
    name: &str,
) -> String {
    decompile(kind, &compile(source), name, &DecompileResolvers::none()).unwrap()
}

#[test]
fn test_canonical_behaviour_roundtrip() {
    let source = "[Priority(2)]
[StartFrom(State_1)]
behaviour Patrol {
\tstarter {
\t\tassign 7(type = 1, locality = 3, preference = 15);
\t\tassign 9;
\t}

\t[ControlPacket(space = 1, turn_rate = 200, -4, 100)]
\t[NonBlocking]
\t[SkipFirstBody]
\tstate State_0(12) {
\t\tdo {
\t\t\tSetSpeed(3);
\t\t}
\t\tif not IsOnGround() {
\t\t\tJump(1, -2);
\t\t\tgoto State_1;
\t\t}
\t}

\t[UseObjectSlot(4)]
\tstate State_1() {
\t\tif HealthBelow(25) {
\t\t\tgoto State_0;
\t\t}
\t\tdo {
\t\t\tWait(30);
\t\t\tCommand_700();
\t\t}
\t}
}
";
    assert_eq!(reprint(ItemKind::Behaviour, source, "Patrol"), source);
}

#[test]
fn test_canonical_sequence_roundtrip() {
    let source = "[GlobalIndex(3)]
[InstanceType(1)]
[Unknown(9)]
sequence Intro {
\tpack(40) {
\t\tWait(1);
\t\tShakeCamera(3, 4);
\t}
\tpack(41) {
\t}
\tPlaySound(5);
}
";
    assert_eq!(reprint(ItemKind::Sequence, source, "Intro"), source);
}

#[test]
fn test_canonical_library_roundtrip() {
    let source = "[Unknown(2)]
library Actors {
\t[GlobalIndex(12)]
\t[Priority(1)]
\t[StartFrom(State_0)]
\tbehaviour Behaviour_12 {
\t\tstate State_0() {
\t\t\tdo {
\t\t\t\tWait(5);
\t\t\t}
\t\t}
\t}

\t[GlobalIndex(13)]
\t[Priority(0)]
\t[StartFrom(State_0)]
\t[Unknown(1)]
\tbehaviour Behaviour_13 {
\t\tstate State_0() {
\t\t}
\t}
}
";
    assert_eq!(reprint(ItemKind::Library, source, "Actors"), source);
}

#[test]
fn test_bytes_survive_decompile() {
    let source = "
        library Actors {
            const BASE = 10;
            [GlobalIndex(BASE + 2)]
            [Priority(BASE)]
            [StartFrom(Run)]
            behaviour Walker {
                const STEP = BASE - 3;
                starter { assign 400(status = 1); }
                state Idle(3) { if PlayerNear(BASE) { goto Run; } }
                [ControlPacket(gravity = BASE, STEP)]
                state Run() { do { SetSpeed(STEP, -STEP); goto Idle; } }
            }
        }
    ";
    let bytes = compile(source);
    let text = decompile(ItemKind::Library, &bytes, "Actors", &DecompileResolvers::none()).unwrap();
    assert_eq!(compile(&text), bytes);
}

#[test]
fn test_symbolic_library_roundtrip() {
    let symbols = ResolverSet::from_toml_str(
        "[graphs]\nWalker = 12\nRunner = 13\n[state_graphs]\nWalk = 3\n[objects]\nCrate = 400\n",
    )
    .unwrap();
    let source = "library Actors {
\t[Priority(0)]
\t[StartFrom(State_0)]
\tbehaviour Walker {
\t\tstarter {
\t\t\tassign Crate(type = 2);
\t\t}

\t\tstate State_0(Walk) {
\t\t}
\t}

\t[Priority(0)]
\t[StartFrom(State_0)]
\tbehaviour Runner {
\t\tstate State_0() {
\t\t}
\t}
}
";
    let bytes = compile_source(source, &symbols.compile_resolvers()).unwrap();
    let text = decompile(ItemKind::Library, &bytes, "Actors", &symbols.decompile_resolvers()).unwrap();
    assert_eq!(text, source);
}

#[derive(Debug, Clone)]
struct GenBody {
    condition: Option<(bool, u16, Option<i32>)>,
    commands: Vec<(u16, Vec<i32>)>,
    jump: Option<usize>,
}

#[derive(Debug, Clone)]
struct GenState {
    target: Option<i16>,
    slot: bool,
    non_blocking: bool,
    skip_first_body: bool,
    bodies: Vec<GenBody>,
}

fn body_strategy() -> impl Strategy<Value = GenBody> {
    let parameter = prop_oneof![Just(None), (1..=i32::MAX).prop_map(Some), (i32::MIN..0).prop_map(Some)];
    (
        proptest::option::of((any::<bool>(), 0u16..16, parameter)),
        proptest::collection::vec((0u16..24, proptest::collection::vec(any::<i32>(), 0..4)), 0..4),
        proptest::option::of(0usize..4),
    )
        .prop_map(|(condition, commands, jump)| GenBody {
            condition,
            commands,
            jump,
        })
}

fn state_strategy() -> impl Strategy<Value = GenState> {
    (
        proptest::option::of(0i16..=i16::MAX),
        any::<bool>(),
        any::<bool>(),
        any::<bool>(),
        proptest::collection::vec(body_strategy(), 0..4),
    )
        .prop_map(|(target, slot, non_blocking, skip_first_body, bodies)| GenState {
            target,
            slot,
            non_blocking,
            skip_first_body,
            bodies,
        })
}

/// Canonical text for a generated behaviour
fn render(
    priority: u8,
    start: usize,
    states: &[GenState],
) -> String {
    let count = states.len();
    let mut out = format!("[Priority({})]\n[StartFrom(State_{})]\nbehaviour Gen {{\n", priority, start % count);
    for (index, state) in states.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        let mut target = String::new();
        match (state.slot, state.target) {
            (true, Some(slot)) => out.push_str(&format!("\t[UseObjectSlot({})]\n", slot)),
            (false, Some(graph)) => target = graph.to_string(),
            _ => {}
        }
        if state.non_blocking {
            out.push_str("\t[NonBlocking]\n");
        }
        if state.skip_first_body {
            out.push_str("\t[SkipFirstBody]\n");
        }
        out.push_str(&format!("\tstate State_{}({}) {{\n", index, target));
        for body in &state.bodies {
            match body.condition {
                Some((negate, id, parameter)) => out.push_str(&format!(
                    "\t\tif {}{}({}) {{\n",
                    if negate { "not " } else { "" },
                    condition_name(id),
                    parameter.map(|p| p.to_string()).unwrap_or_default()
                )),
                None => out.push_str("\t\tdo {\n"),
            }
            for (id, args) in &body.commands {
                let args: Vec<_> = args.iter().map(i32::to_string).collect();
                out.push_str(&format!("\t\t\t{}({});\n", command_name(*id), args.join(", ")));
            }
            if let Some(jump) = body.jump {
                out.push_str(&format!("\t\t\tgoto State_{};\n", jump % count));
            }
            out.push_str("\t\t}\n");
        }
        out.push_str("\t}\n");
    }
    out.push_str("}\n");
    out
}

proptest! {
    #[test]
    fn prop_canonical_text_roundtrips(
        priority in any::<u8>(),
        start in 0usize..4,
        states in proptest::collection::vec(state_strategy(), 1..4),
    ) {
        let source = render(priority, start, &states);
        let bytes = compile(&source);
        let text = decompile(ItemKind::Behaviour, &bytes, "Gen", &DecompileResolvers::none()).unwrap();
        prop_assert_eq!(&text, &source);
        prop_assert_eq!(compile(&text), bytes);
    }
}
