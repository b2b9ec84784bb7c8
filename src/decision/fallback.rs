use crate::models::{ResponseCategory, Scenario};

/// Built-in scenarios used whenever the content provider cannot supply enough.
pub fn fallback_scenarios() -> Vec<Scenario> {
    use ResponseCategory::*;

    vec![
        Scenario::new(
            "You have a big test tomorrow but your friends are going out tonight.",
            vec![
                ("Study at home", Calm),
                ("Go out with friends", Impulsive),
                ("Ignore both", Avoidant),
            ],
        ),
        Scenario::new(
            "Someone posts something mean about you online.",
            vec![
                ("Talk to them directly", Calm),
                ("Post something back", Impulsive),
                ("Pretend you didn't see it", Avoidant),
            ],
        ),
    ]
}
