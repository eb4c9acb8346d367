use serde::Deserialize;
use wsspolicy::{EnforcerContext, Policy, PolicyEnforcer, SecurityEvent, SecurityToken};

/// A recorded message: the tokens found in it and the events produced
/// while validating it. Events refer to tokens by their index in `tokens`.
#[derive(Deserialize)]
struct Recording {
    #[serde(default)]
    context: EnforcerContext,
    tokens: Vec<SecurityToken>,
    events: Vec<SecurityEvent>,
}

fn main() {
    let mut args = std::env::args().skip(1);
    let (policy_path, recording_path) = match (args.next(), args.next()) {
        (Some(p), Some(r)) => (p, r),
        _ => {
            eprintln!("usage: check_policy <policy.json> <recording.json>");
            std::process::exit(2);
        }
    };
    let policy: Policy =
        serde_json::from_str(&std::fs::read_to_string(&policy_path).unwrap()).unwrap();
    let recording: Recording =
        serde_json::from_str(&std::fs::read_to_string(&recording_path).unwrap()).unwrap();

    let mut enforcer = PolicyEnforcer::new(&policy, recording.context).unwrap();
    for token in recording.tokens {
        enforcer.add_token(token);
    }
    for event in recording.events {
        eprintln!("event: {:?}", event.kind());
        if let Err(e) = enforcer.register_security_event(event) {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
    match enforcer.do_final() {
        Ok(true) => eprintln!("OK"),
        Ok(false) => {
            for (assertion, error) in enforcer.unsatisfied() {
                eprintln!("unsatisfied: {assertion}: {}", error.unwrap_or_default());
            }
            eprintln!("FAIL (soft)");
        }
        Err(e) => {
            eprintln!("FAIL: {e}");
            std::process::exit(1);
        }
    }
}
