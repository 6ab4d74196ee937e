use std::{cell::RefCell, ffi::OsStr, str::FromStr};

/// Defaults read from the environment, used when no flag is given.
#[derive(Clone, Copy)]
struct Env {
    seed: Option<u64>,
    fault_limit: Option<u32>,
    step_limit: Option<u64>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

pub fn init() {
    let value = Env {
        seed: var_parsed("MAILROOM_SEED"),
        fault_limit: var_parsed("MAILROOM_FAULT_LIMIT"),
        step_limit: var_parsed("MAILROOM_STEP_LIMIT"),
    };
    set_env(value);
}

pub fn seed() -> Option<u64> {
    with_env(|env| env.seed)
}

pub fn fault_limit() -> Option<u32> {
    with_env(|env| env.fault_limit)
}

pub fn step_limit() -> Option<u64> {
    with_env(|env| env.step_limit)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

/// Unset or unparsable variables are ignored.
fn var_parsed<T: FromStr>(name: impl AsRef<OsStr>) -> Option<T> {
    std::env::var(name.as_ref())
        .ok()
        .and_then(|value| value.trim().parse().ok())
}
