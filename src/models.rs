//! 常用示例网，供命令行 `--model` 与测试使用。
use crate::net::{Net, NetError, Place, Transition, Weight};

pub const NAMES: &[&str] = &[
    "two-place-cycle",
    "token-generator",
    "producer-chain",
    "traffic-light",
];

pub fn by_name(name: &str) -> Option<Result<Net, NetError>> {
    match name {
        "two-place-cycle" => Some(two_place_cycle()),
        "token-generator" => Some(token_generator()),
        "producer-chain" => Some(producer_chain()),
        "traffic-light" => Some(traffic_light()),
        _ => None,
    }
}

/// Declares `places` with their initial tokens, then one transition per entry
/// of `transitions` with its weighted consume and produce lists.
fn assemble(
    places: &[(&str, Weight)],
    transitions: &[(&str, &[(&str, Weight)], &[(&str, Weight)])],
) -> Result<Net, NetError> {
    let mut net = Net::empty();
    for &(name, tokens) in places {
        net.add_place(Place::new_with_tokens(name, tokens))?;
    }
    for &(name, consumes, produces) in transitions {
        let transition = net.add_transition(Transition::new(name))?;
        for &(place, weight) in consumes {
            let place = net
                .place_by_name(place)
                .ok_or_else(|| NetError::UnknownPlace(place.to_owned()))?;
            net.add_input_arc(place, transition, weight)?;
        }
        for &(place, weight) in produces {
            let place = net
                .place_by_name(place)
                .ok_or_else(|| NetError::UnknownPlace(place.to_owned()))?;
            net.add_output_arc(place, transition, weight)?;
        }
    }
    Ok(net)
}

/// p1 -> t1 -> p2 -> t2 -> p1 with one token in p1.
pub fn two_place_cycle() -> Result<Net, NetError> {
    assemble(
        &[("p1", 1), ("p2", 0)],
        &[
            ("t1", &[("p1", 1)], &[("p2", 1)]),
            ("t2", &[("p2", 1)], &[("p1", 1)]),
        ],
    )
}

/// t1 keeps its token in p1 and adds one to p2; t2 drains p2. Unbounded in p2.
pub fn token_generator() -> Result<Net, NetError> {
    assemble(
        &[("p1", 1), ("p2", 0)],
        &[
            ("t1", &[("p1", 1)], &[("p1", 1), ("p2", 1)]),
            ("t2", &[("p2", 1)], &[]),
        ],
    )
}

/// P1 -> T1 -> P2 -> T2 -> 2·P3, ending in a deadlock.
pub fn producer_chain() -> Result<Net, NetError> {
    assemble(
        &[("P1", 1), ("P2", 0), ("P3", 0)],
        &[
            ("T1", &[("P1", 1)], &[("P2", 1)]),
            ("T2", &[("P2", 1)], &[("P3", 2)]),
        ],
    )
}

/// Two-road crossing. A road may turn green only while both roads show red,
/// and the green and yellow phases each hold a timer token.
pub fn traffic_light() -> Result<Net, NetError> {
    assemble(
        &[
            ("NS_Red", 1),
            ("NS_Green", 0),
            ("NS_Yellow", 0),
            ("EW_Red", 0),
            ("EW_Green", 1),
            ("EW_Yellow", 0),
            ("Timer_Green", 1),
            ("Timer_Yellow", 0),
        ],
        &[
            (
                "T_NS_Green_Start",
                &[("NS_Red", 1), ("EW_Red", 1)],
                &[("NS_Green", 1), ("EW_Red", 1), ("Timer_Green", 1)],
            ),
            (
                "T_NS_Yellow_Start",
                &[("NS_Green", 1), ("Timer_Green", 1)],
                &[("NS_Yellow", 1), ("Timer_Yellow", 1)],
            ),
            (
                "T_NS_Yellow_End",
                &[("NS_Yellow", 1), ("Timer_Yellow", 1)],
                &[("NS_Red", 1)],
            ),
            (
                "T_EW_Green_Start",
                &[("EW_Red", 1), ("NS_Red", 1)],
                &[("EW_Green", 1), ("NS_Red", 1), ("Timer_Green", 1)],
            ),
            (
                "T_EW_Yellow_Start",
                &[("EW_Green", 1), ("Timer_Green", 1)],
                &[("EW_Yellow", 1), ("Timer_Yellow", 1)],
            ),
            (
                "T_EW_Yellow_End",
                &[("EW_Yellow", 1), ("Timer_Yellow", 1)],
                &[("EW_Red", 1)],
            ),
        ],
    )
}
