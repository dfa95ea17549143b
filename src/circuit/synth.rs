//! Circuit synthesis: [`CircuitSpec`] to [`CircuitProgram`].
//!
//! Every loop bound and index below is derived from the circuit's [`TreeShape`], the same
//! value the off-circuit Merkle builder pads with. Emitting a circuit twice for the
//! same [`CircuitSpec`] yields the same program.
//!
//! [`TreeShape`]: crate::config::TreeShape

use tracing::debug;

use super::ir::{
    CircuitProgram, ComponentDecl, Expr, Gadget, Index, MainComponent, Module, Place, SignalDecl,
    Stmt, Template,
};
use super::CircuitSpec;
use crate::config::{
    RootBinding, MAIN_CIRCUIT_FILE, MERKLE_CIRCUIT_FILE, UNIQUE_CIRCUIT_FILE,
};
use crate::error::TreeKind;

pub const MERKLE_TEMPLATE: &str = "MerkleRoot";
pub const UNIQUE_TEMPLATE: &str = "UniquenessChecker";
pub const MAIN_TEMPLATE: &str = "Main";

/// Build the three-module program for `spec`.
pub fn synthesize(spec: &CircuitSpec) -> CircuitProgram {
    debug!(
        "Synthesizing circuit: rows={}, leaves={}, depth={}, threshold={:?}, binding={:?}",
        spec.shape.num_rows, spec.shape.num_leaves, spec.shape.depth, spec.threshold, spec.root_binding
    );
    CircuitProgram {
        modules: vec![
            merkle_root_module(spec),
            uniqueness_module(spec),
            main_module(spec),
        ],
    }
}

fn leaves_signal(tree: TreeKind) -> String {
    format!("leaves_{}", tree)
}

fn expected_root_signal(tree: TreeKind) -> String {
    format!("expectedRoot_{}", tree)
}

fn root_signal(tree: TreeKind) -> String {
    format!("root_{}", tree)
}

fn merkle_root_module(spec: &CircuitSpec) -> Module {
    let num_leaves = spec.shape.num_leaves;
    let half = num_leaves / 2;
    let root_gate = num_leaves - 2;

    let mut signals = Vec::new();
    let mut components = Vec::new();
    let mut body = Vec::new();

    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::input(&leaves_signal(tree), Some(num_leaves)));
    }
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::input(&expected_root_signal(tree), None));
    }
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::output(&root_signal(tree)));
    }

    for tree in [TreeKind::Original, TreeKind::Sorted] {
        let hashers = format!("hashers_{}", tree);
        let leaves = leaves_signal(tree);
        components.push(ComponentDecl::gadget(
            &hashers,
            Some(num_leaves - 1),
            Gadget::Poseidon2,
        ));

        body.push(Stmt::comment(format!("Merkle tree over the {} leaves", tree)));
        let i = || Index::var("i");
        body.push(Stmt::for_range(
            "i",
            0,
            half,
            vec![
                Stmt::instantiate(Place::signal(&hashers).at(i())),
                Stmt::assign(
                    Place::signal(&hashers).at(i()).port_at("inputs", 0),
                    Place::signal(&leaves).at(i().times(2)),
                ),
                Stmt::assign(
                    Place::signal(&hashers).at(i()).port_at("inputs", 1),
                    Place::signal(&leaves).at(i().times(2).plus(1)),
                ),
            ],
        ));

        if half < num_leaves - 1 {
            let child = || i().minus(half).times(2);
            body.push(Stmt::for_range(
                "i",
                half,
                num_leaves - 1,
                vec![
                    Stmt::instantiate(Place::signal(&hashers).at(i())),
                    Stmt::assign(
                        Place::signal(&hashers).at(i()).port_at("inputs", 0),
                        Place::signal(&hashers).at(child()).port("out"),
                    ),
                    Stmt::assign(
                        Place::signal(&hashers).at(i()).port_at("inputs", 1),
                        Place::signal(&hashers).at(child().plus(1)).port("out"),
                    ),
                ],
            ));
        }

        body.push(Stmt::assign(
            Place::signal(&root_signal(tree)),
            Place::signal(&hashers).at(root_gate).port("out"),
        ));
    }

    if spec.root_binding == RootBinding::Enforced {
        body.push(Stmt::comment("Bind computed roots to the expected roots"));
        for tree in [TreeKind::Original, TreeKind::Sorted] {
            body.push(Stmt::assert_eq(
                Place::signal(&root_signal(tree)),
                Place::signal(&expected_root_signal(tree)),
            ));
        }
    }

    Module {
        file_name: MERKLE_CIRCUIT_FILE.to_string(),
        includes: vec!["poseidon.circom".to_string()],
        template: Template {
            name: MERKLE_TEMPLATE.to_string(),
            signals,
            components,
            body,
        },
        main: None,
    }
}

fn uniqueness_module(spec: &CircuitSpec) -> Module {
    let num_rows = spec.shape.num_rows;
    let pairs = num_rows - 1;
    let last = num_rows - 2;
    let i = || Index::var("i");

    let mut signals = vec![
        SignalDecl::input("rows", Some(num_rows)),
        SignalDecl::output("is_unique"),
    ];
    let mut components = vec![ComponentDecl::gadget("isZero", Some(pairs), Gadget::IsZero)];
    let mut body = Vec::new();

    let adjacent_diff = Expr::sub(
        Place::signal("rows").at(i().plus(1)).into(),
        Place::signal("rows").at(i()).into(),
    );

    match spec.threshold {
        None => {
            signals.push(SignalDecl::intermediate("uniqueCheck", Some(pairs)));
            signals.push(SignalDecl::intermediate("intermediate", Some(pairs)));

            body.push(Stmt::comment("Compare adjacent sorted rows"));
            body.push(Stmt::for_range(
                "i",
                0,
                pairs,
                vec![
                    Stmt::instantiate(Place::signal("isZero").at(i())),
                    Stmt::assign(Place::signal("isZero").at(i()).port("in"), adjacent_diff),
                    Stmt::assign(
                        Place::signal("uniqueCheck").at(i()),
                        Expr::sub(
                            Expr::Const(1),
                            Place::signal("isZero").at(i()).port("out").into(),
                        ),
                    ),
                ],
            ));

            body.push(Stmt::assign(
                Place::signal("intermediate").at(0),
                Place::signal("uniqueCheck").at(0),
            ));
            if pairs > 1 {
                body.push(Stmt::for_range(
                    "i",
                    1,
                    pairs,
                    vec![Stmt::assign(
                        Place::signal("intermediate").at(i()),
                        Expr::mul(
                            Place::signal("intermediate").at(i().minus(1)).into(),
                            Place::signal("uniqueCheck").at(i()).into(),
                        ),
                    )],
                ));
            }
            body.push(Stmt::assign(
                Place::signal("is_unique"),
                Place::signal("intermediate").at(last),
            ));
        }
        Some(threshold) => {
            signals.push(SignalDecl::output("is_below_threshold"));
            signals.push(SignalDecl::intermediate("duplicateFlags", Some(pairs)));
            signals.push(SignalDecl::intermediate("duplicateCount", Some(pairs)));
            signals.push(SignalDecl::intermediate("threshold", None));
            components.push(ComponentDecl::gadget("isZeroCheck", None, Gadget::IsZero));
            components.push(ComponentDecl::gadget(
                "lessThan",
                None,
                Gadget::LessThan {
                    bits: threshold.comparator_bits,
                },
            ));

            body.push(Stmt::comment("Flag adjacent equal sorted rows"));
            body.push(Stmt::for_range(
                "i",
                0,
                pairs,
                vec![
                    Stmt::instantiate(Place::signal("isZero").at(i())),
                    Stmt::assign(Place::signal("isZero").at(i()).port("in"), adjacent_diff),
                    Stmt::assign(
                        Place::signal("duplicateFlags").at(i()),
                        Place::signal("isZero").at(i()).port("out"),
                    ),
                ],
            ));

            body.push(Stmt::assign(
                Place::signal("duplicateCount").at(0),
                Place::signal("duplicateFlags").at(0),
            ));
            if pairs > 1 {
                body.push(Stmt::for_range(
                    "i",
                    1,
                    pairs,
                    vec![Stmt::assign(
                        Place::signal("duplicateCount").at(i()),
                        Expr::add(
                            Place::signal("duplicateCount").at(i().minus(1)).into(),
                            Place::signal("duplicateFlags").at(i()).into(),
                        ),
                    )],
                ));
            }

            body.push(Stmt::comment("No duplicates at all"));
            body.push(Stmt::instantiate(Place::signal("isZeroCheck")));
            body.push(Stmt::assign(
                Place::signal("isZeroCheck").port("in"),
                Place::signal("duplicateCount").at(last),
            ));
            body.push(Stmt::assign(
                Place::signal("is_unique"),
                Place::signal("isZeroCheck").port("out"),
            ));

            body.push(Stmt::comment("Duplicates allowed, rounded down"));
            body.push(Stmt::assign(
                Place::signal("threshold"),
                Expr::int_div(
                    Expr::mul(
                        Expr::Const(u64::from(threshold.percent)),
                        Expr::Const(num_rows as u64),
                    ),
                    Expr::Const(100),
                ),
            ));
            body.push(Stmt::instantiate(Place::signal("lessThan")));
            body.push(Stmt::assign(
                Place::signal("lessThan").port_at("in", 0),
                Place::signal("duplicateCount").at(last),
            ));
            body.push(Stmt::assign(
                Place::signal("lessThan").port_at("in", 1),
                Place::signal("threshold"),
            ));
            body.push(Stmt::assign(
                Place::signal("is_below_threshold"),
                Place::signal("lessThan").port("out"),
            ));
        }
    }

    Module {
        file_name: UNIQUE_CIRCUIT_FILE.to_string(),
        includes: vec!["comparators.circom".to_string()],
        template: Template {
            name: UNIQUE_TEMPLATE.to_string(),
            signals,
            components,
            body,
        },
        main: None,
    }
}

fn main_module(spec: &CircuitSpec) -> Module {
    let num_leaves = spec.shape.num_leaves;
    let num_rows = spec.shape.num_rows;
    let i = || Index::var("i");

    let mut signals = Vec::new();
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::input(&leaves_signal(tree), Some(num_leaves)));
    }
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::input(&expected_root_signal(tree), None));
    }
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        signals.push(SignalDecl::output(&root_signal(tree)));
    }
    signals.push(SignalDecl::output("is_unique"));
    if spec.threshold.is_some() {
        signals.push(SignalDecl::output("is_below_threshold"));
    }

    let components = vec![
        ComponentDecl::template("merkle", MERKLE_TEMPLATE),
        ComponentDecl::template("uniqueness", UNIQUE_TEMPLATE),
    ];

    let mut body = vec![
        Stmt::instantiate(Place::signal("merkle")),
        Stmt::instantiate(Place::signal("uniqueness")),
        Stmt::comment("Both trees see the padded leaves"),
        Stmt::for_range(
            "i",
            0,
            num_leaves,
            [TreeKind::Original, TreeKind::Sorted]
                .into_iter()
                .map(|tree| {
                    Stmt::assign(
                        Place::signal("merkle").port_at(&leaves_signal(tree), i()),
                        Place::signal(&leaves_signal(tree)).at(i()),
                    )
                })
                .collect(),
        ),
    ];
    for tree in [TreeKind::Original, TreeKind::Sorted] {
        body.push(Stmt::assign(
            Place::signal("merkle").port(&expected_root_signal(tree)),
            Place::signal(&expected_root_signal(tree)),
        ));
    }

    body.push(Stmt::comment("Uniqueness only checks the real sorted rows"));
    body.push(Stmt::for_range(
        "i",
        0,
        num_rows,
        vec![Stmt::assign(
            Place::signal("uniqueness").port_at("rows", i()),
            Place::signal(&leaves_signal(TreeKind::Sorted)).at(i()),
        )],
    ));

    for tree in [TreeKind::Original, TreeKind::Sorted] {
        body.push(Stmt::assign(
            Place::signal(&root_signal(tree)),
            Place::signal("merkle").port(&root_signal(tree)),
        ));
    }
    body.push(Stmt::assign(
        Place::signal("is_unique"),
        Place::signal("uniqueness").port("is_unique"),
    ));
    if spec.threshold.is_some() {
        body.push(Stmt::assign(
            Place::signal("is_below_threshold"),
            Place::signal("uniqueness").port("is_below_threshold"),
        ));
    }

    Module {
        file_name: MAIN_CIRCUIT_FILE.to_string(),
        includes: vec![
            format!("./{}", MERKLE_CIRCUIT_FILE),
            format!("./{}", UNIQUE_CIRCUIT_FILE),
        ],
        template: Template {
            name: MAIN_TEMPLATE.to_string(),
            signals,
            components,
            body,
        },
        main: Some(MainComponent {
            public: vec![
                expected_root_signal(TreeKind::Original),
                expected_root_signal(TreeKind::Sorted),
            ],
        }),
    }
}
