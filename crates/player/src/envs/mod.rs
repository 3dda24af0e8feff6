//! Built-in environments selectable by id.

mod catch;
mod invaders;

use harness::{EnvError, Environment};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub(crate) use catch::Catch;
pub(crate) use invaders::Invaders;

pub(crate) const KNOWN_ENV_IDS: [&str; 2] = [invaders::ENV_ID, catch::ENV_ID];

pub(crate) fn make_env(id: &str, seed: Option<u64>) -> Result<Box<dyn Environment>, EnvError> {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    match id {
        invaders::ENV_ID => Ok(Box::new(Invaders::new(rng))),
        catch::ENV_ID => Ok(Box::new(Catch::new(rng))),
        other => Err(EnvError::UnknownId {
            id: other.to_string(),
            known: KNOWN_ENV_IDS.join(", "),
        }),
    }
}

#[cfg(test)]
mod tests {
    use harness::ActionSpace;

    use super::*;

    #[test]
    fn known_ids_build_discrete_environments() {
        let invaders = make_env("SpaceInvaders-v4", Some(1)).expect("invaders");
        let catch = make_env("Catch-v0", Some(1)).expect("catch");
        assert_eq!(invaders.action_space(), ActionSpace::Discrete(6));
        assert_eq!(catch.action_space(), ActionSpace::Discrete(3));
    }

    #[test]
    fn unknown_id_lists_known_ids() {
        let error = make_env("Pong-v0", None).err().expect("unknown");
        let message = error.to_string();
        assert!(message.contains("Pong-v0"));
        assert!(message.contains("SpaceInvaders-v4"));
        assert!(message.contains("Catch-v0"));
    }
}
