use super::vocab::{
    bare_words, parse_count, CANCEL_WORDS, CLAUSE_DELIMITER, CONFIRM_WORDS, INGREDIENT_PHRASES,
    MARK_STEPS, NUMBER, PICK_DISPLAY_LIMIT, RESET_PHRASES, STEP_PHRASES, STRIKE_PREFIXES,
    SUBSTITUTION, UNSTRIKE_PREFIXES,
};
use super::{Dispatch, Turn};
use crate::format::{render_ingredients, render_steps, COMMANDS_CONDENSED};
use crate::state::CookingState;

fn is_number(text: &str) -> bool {
    NUMBER.is_match(text)
}

fn contains_any(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

fn working_ingredients(turn: &Turn<'_>, state: &CookingState) -> Vec<String> {
    render_ingredients(
        &turn.recipe.ingredients,
        &state.ingredient_subs,
        &state.ingredient_strikes,
    )
}

pub(super) fn cancel_search(turn: &Turn<'_>) -> Option<Dispatch> {
    if !turn.state.pending_recipe_pick || !CANCEL_WORDS.contains(&turn.lower.as_str()) {
        return None;
    }
    let mut next = turn.state.clone();
    next.clear_pick_mode();
    Some(Dispatch::update(
        format!(
            "Okay, I've exited recipe search. We're still cooking {}.",
            turn.recipe.name
        ),
        next,
    ))
}

pub(super) fn full_reset(turn: &Turn<'_>) -> Option<Dispatch> {
    if !contains_any(&turn.lower, &RESET_PHRASES) {
        return None;
    }
    Some(Dispatch::Restart {
        reply: turn.recipe.greeting(),
        new_state: turn.state.reset(),
    })
}

pub(super) fn mark_steps_done(turn: &Turn<'_>) -> Option<Dispatch> {
    let caps = MARK_STEPS.captures(&turn.lower)?;
    let step_count = turn.recipe.step_count();
    let mut next = turn.state.clone();
    let n = next.mark_done_through(parse_count(&caps[1]), step_count);

    let mut lines = Vec::new();
    if n == 0 {
        lines.push("Okay, I've reset your step progress. You're back at the beginning.".to_string());
    } else if n >= step_count {
        lines.push(format!(
            "Okay, I've marked all {step_count} steps as done. You've completed the recipe!"
        ));
    } else {
        lines.push(format!(
            "Got it. I've marked steps 1 through {n} as done. You're now on step {}.",
            n + 1
        ));
    }
    lines.push(String::new());
    lines.push("Here are all the steps with your updated progress:".to_string());
    lines.push(String::new());
    lines.extend(render_steps(&turn.recipe.steps, n));
    Some(Dispatch::update(lines.join("\n"), next))
}

pub(super) fn enter_pick_mode(turn: &Turn<'_>) -> Option<Dispatch> {
    if turn.lower != "pick" {
        return None;
    }
    let mut next = turn.state.clone();
    next.pending_recipe_pick = true;
    next.pick_candidates = None;
    Some(Dispatch::update(
        format!(
            "Let's find a recipe. There are {} in the library, so type a keyword to search \
             (for example: chicken, pasta, soup), or 'cancel' to keep cooking {}.",
            turn.library.len(),
            turn.recipe.name
        ),
        next,
    ))
}

pub(super) fn pick_search(turn: &Turn<'_>) -> Option<Dispatch> {
    if !turn.state.pending_recipe_pick || is_number(&turn.lower) {
        return None;
    }
    let tokens: Vec<&str> = turn.lower.split_whitespace().collect();
    if tokens.is_empty() {
        return Some(Dispatch::reply(
            "Type a keyword to search for a recipe, or 'cancel' to stop picking.",
        ));
    }
    let query = tokens.join(" ");

    let matches: Vec<_> = turn
        .library
        .catalog()
        .iter()
        .filter(|entry| {
            let name = entry.name.to_lowercase();
            tokens.iter().all(|t| name.contains(t))
        })
        .collect();

    let mut next = turn.state.clone();
    if matches.is_empty() {
        next.pick_candidates = None;
        return Some(Dispatch::update(
            format!(
                "I couldn't find any recipes matching '{query}'. \
                 Try another keyword, or 'cancel' to keep cooking."
            ),
            next,
        ));
    }

    let shown = &matches[..matches.len().min(PICK_DISPLAY_LIMIT)];
    let mut lines = vec![format!("Recipes matching '{query}':"), String::new()];
    for (i, entry) in shown.iter().enumerate() {
        lines.push(format!("{}. {}", i + 1, entry.name));
    }
    let overflow = matches.len() - shown.len();
    if overflow > 0 {
        lines.push(String::new());
        lines.push(format!(
            "...and {overflow} more. Add another keyword to narrow it down."
        ));
    }
    lines.push(String::new());
    lines.push(
        "Reply with a number to pick one of these recipes, or type another keyword to search again."
            .to_string(),
    );

    next.pick_candidates = Some(shown.iter().map(|e| e.key.clone()).collect());
    Some(Dispatch::update(lines.join("\n"), next))
}

pub(super) fn pick_select(turn: &Turn<'_>) -> Option<Dispatch> {
    if !turn.state.pending_recipe_pick || !is_number(&turn.lower) {
        return None;
    }
    let Some(candidates) = turn.state.pick_candidates.as_ref() else {
        return Some(Dispatch::reply(
            "Search for a recipe first by typing a keyword, then reply with its number.",
        ));
    };
    let n = parse_count(&turn.lower);
    if n == 0 || n > candidates.len() {
        return Some(Dispatch::reply(format!(
            "There are only {count} recipes in that list. Please pick a number between 1 and {count}.",
            count = candidates.len()
        )));
    }
    let key = &candidates[n - 1];
    match turn.library.get(key) {
        Some(recipe) => Some(Dispatch::Restart {
            reply: recipe.greeting(),
            new_state: CookingState::new(key.clone()),
        }),
        None => {
            let mut next = turn.state.clone();
            next.pick_candidates = None;
            Some(Dispatch::update(
                "That recipe is no longer available. Type a keyword to search again.",
                next,
            ))
        }
    }
}

pub(super) fn show_step(turn: &Turn<'_>) -> Option<Dispatch> {
    if !is_number(&turn.lower) {
        return None;
    }
    let n = parse_count(&turn.lower);
    let steps = &turn.recipe.steps;
    let reply = if (1..=steps.len()).contains(&n) {
        format!("{n}. {}", steps[n - 1])
    } else {
        format!("This recipe only has {} steps.", steps.len())
    };
    Some(Dispatch::reply(reply))
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum StrikeOp {
    Strike,
    Unstrike,
}

/// Target after the first matching prefix. A bare command word yields an empty target.
fn strip_any<'a>(lower: &'a str, prefixes: &[&str]) -> Option<&'a str> {
    prefixes.iter().find_map(|p| {
        if lower == p.trim_end() {
            Some("")
        } else {
            lower.strip_prefix(*p).map(str::trim)
        }
    })
}

fn strike_command(lower: &str) -> Option<(StrikeOp, &str)> {
    strip_any(lower, &STRIKE_PREFIXES)
        .map(|target| (StrikeOp::Strike, target))
        .or_else(|| strip_any(lower, &UNSTRIKE_PREFIXES).map(|target| (StrikeOp::Unstrike, target)))
}

pub(super) fn strike_ingredient(turn: &Turn<'_>) -> Option<Dispatch> {
    let (op, target) = strike_command(&turn.lower)?;
    if target.is_empty() {
        return Some(Dispatch::reply(
            "Tell me which ingredient to change, for example: `x oil` or `86 butter`.",
        ));
    }

    let subs = &turn.state.ingredient_subs;
    let matching: Vec<&String> = turn
        .recipe
        .ingredients
        .iter()
        .filter(|ing| {
            let mut searchable = ing.to_lowercase();
            if let Some(sub) = subs.get(ing.as_str()) {
                searchable.push(' ');
                searchable.push_str(&sub.to_lowercase());
            }
            searchable.contains(target)
        })
        .collect();

    if matching.is_empty() {
        let mut lines = vec![
            format!("I couldn't find an ingredient matching '{target}' in this recipe."),
            "Here are the ingredients I see:".to_string(),
            String::new(),
        ];
        lines.extend(working_ingredients(turn, turn.state));
        return Some(Dispatch::reply(lines.join("\n")));
    }

    let mut next = turn.state.clone();
    for ing in matching {
        match op {
            StrikeOp::Strike => {
                next.ingredient_strikes.insert(ing.clone());
            }
            StrikeOp::Unstrike => {
                next.ingredient_strikes.remove(ing);
            }
        }
    }

    let header = match op {
        StrikeOp::Strike => "Got it. I updated your ingredient list. Here is the current version:",
        StrikeOp::Unstrike => "Got it. I restored those ingredients. Here is the current list:",
    };
    let mut lines = vec![header.to_string(), String::new()];
    lines.extend(working_ingredients(turn, &next));
    Some(Dispatch::update(lines.join("\n"), next))
}

pub(super) fn substitute(turn: &Turn<'_>) -> Option<Dispatch> {
    let requests: Vec<(String, String)> = CLAUSE_DELIMITER
        .split(turn.raw)
        .filter_map(|clause| SUBSTITUTION.captures(clause.trim()))
        .map(|caps| (caps[1].trim().to_string(), caps[2].trim().to_lowercase()))
        .filter(|(new, original)| !new.is_empty() && !original.is_empty())
        .collect();
    if requests.is_empty() {
        return None;
    }

    let mut next = turn.state.clone();
    let mut applied = 0usize;
    for (new, original) in &requests {
        for ing in &turn.recipe.ingredients {
            if ing.to_lowercase().contains(original.as_str()) {
                next.ingredient_subs.insert(ing.clone(), new.clone());
                applied += 1;
            }
        }
    }

    if applied == 0 {
        let wanted: Vec<String> = requests.iter().map(|(_, o)| format!("'{o}'")).collect();
        let mut lines = vec![
            format!(
                "I couldn't find an ingredient matching {} in this recipe.",
                wanted.join(", ")
            ),
            "Here are the ingredients I see:".to_string(),
            String::new(),
        ];
        lines.extend(working_ingredients(turn, turn.state));
        return Some(Dispatch::reply(lines.join("\n")));
    }

    let mut lines = vec![
        "Got it. Here is your working ingredient list:".to_string(),
        String::new(),
    ];
    lines.extend(working_ingredients(turn, &next));
    Some(Dispatch::update(lines.join("\n"), next))
}

pub(super) fn list_ingredients(turn: &Turn<'_>) -> Option<Dispatch> {
    if turn.lower != "i" && !contains_any(&turn.lower, &INGREDIENT_PHRASES) {
        return None;
    }
    if turn.recipe.ingredients.is_empty() {
        return Some(Dispatch::reply(
            "This recipe does not have a stored ingredient list yet.",
        ));
    }
    let mut lines = vec![
        "Here are the ingredients for this recipe (with substitutions applied):".to_string(),
        String::new(),
    ];
    lines.extend(working_ingredients(turn, turn.state));
    Some(Dispatch::reply(lines.join("\n")))
}

pub(super) fn list_steps(turn: &Turn<'_>) -> Option<Dispatch> {
    if turn.lower != "s" && !contains_any(&turn.lower, &STEP_PHRASES) {
        return None;
    }
    if turn.recipe.steps.is_empty() {
        return Some(Dispatch::reply("This recipe does not have any steps defined yet."));
    }
    let mut lines = vec!["Here are all the steps for this recipe:".to_string(), String::new()];
    lines.extend(render_steps(&turn.recipe.steps, turn.state.current_step));
    Some(Dispatch::reply(lines.join("\n")))
}

pub(super) fn status(turn: &Turn<'_>) -> Option<Dispatch> {
    if turn.lower != "what" {
        return None;
    }
    let recipe = turn.recipe;
    let current = turn.state.current_step;
    let mut lines = vec![format!("### You are cooking: {}", recipe.name), String::new()];

    if !recipe.ingredients.is_empty() {
        lines.push("#### Ingredients (with substitutions applied)".to_string());
        lines.push(String::new());
        lines.extend(working_ingredients(turn, turn.state));
        lines.push(String::new());
    }

    if turn.state.is_complete(recipe.step_count()) {
        lines.push("You've completed all the steps in this recipe.".to_string());
    } else {
        lines.push("#### Current step".to_string());
        lines.push(String::new());
        lines.push(format!(
            "You're on step {} of {}:",
            current + 1,
            recipe.step_count()
        ));
        lines.push(String::new());
        lines.push(format!("{}. {}", current + 1, recipe.steps[current]));
    }

    lines.push(String::new());
    lines.push("---".to_string());
    lines.push(String::new());
    lines.push(COMMANDS_CONDENSED.to_string());
    Some(Dispatch::reply(lines.join("\n")))
}

pub(super) fn advance(turn: &Turn<'_>) -> Option<Dispatch> {
    let words = bare_words(&turn.lower);
    if !CONFIRM_WORDS.contains(&words.as_str()) {
        return None;
    }
    let steps = &turn.recipe.steps;
    let mut next = turn.state.clone();
    let index = next.current_step;
    if !next.advance(steps.len()) {
        return Some(Dispatch::reply(
            "You've already completed all the steps in this recipe.",
        ));
    }
    Some(Dispatch::Handled {
        reply: format!("Next step:\n\n{}. {}", index + 1, steps[index]),
        new_state: Some(next),
        advance_step: true,
    })
}
