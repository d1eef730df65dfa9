use clap::Parser;
use rand::rngs::ThreadRng;
use rand::Rng;
use serde_json::{json, Value};
use std::fs;

/// A CLI tool to generate random but well-formed flow JSON documents for
/// exercising the kaiwa runtime by hand.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// The path to write the generated JSON file to
    #[arg(short, long, default_value = "generated_flow.json")]
    output: String,

    /// How many nodes to generate between the start and end nodes
    #[arg(long, default_value_t = 5)]
    nodes: usize,
}

const GREETINGS: &[&str] = &[
    "Hi there! Great to see you.",
    "Welcome! Let's get you set up.",
    "Hello! I have a few quick questions.",
];

const PROMPTS: &[&str] = &[
    "Would you like to hear more?",
    "Which of these fits you best?",
    "Shall we continue?",
];

const STATEMENTS: &[&str] = &[
    "Thanks, noted!",
    "Here is something you might find useful.",
    "Almost there, just a little more.",
    "Good choice.",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut rng = rand::rng();

    println!("Generating a flow with {} middle nodes...", cli.nodes);

    let mut nodes: Vec<Value> = Vec::new();
    let mut edges: Vec<Value> = Vec::new();

    nodes.push(json!({
        "id": "start",
        "type": "start",
        "data": {
            "label": "Start",
            "elements": [text_element(&mut rng, GREETINGS)],
        }
    }));

    let mut previous = "start".to_string();
    for index in 0..cli.nodes {
        let id = format!("node-{}", index + 1);
        let elements = random_elements(&mut rng, &id, cli.nodes, index);
        nodes.push(json!({
            "id": id.clone(),
            "data": {
                "label": format!("Step {}", index + 1),
                "elements": elements,
            }
        }));
        edges.push(json!({ "source": previous, "target": id.clone() }));
        previous = id;
    }

    nodes.push(json!({
        "id": "end",
        "type": "end",
        "data": {
            "label": "End",
            "elements": [{ "type": "text", "content": "That's all, thanks for chatting!" }],
        }
    }));
    edges.push(json!({ "source": previous, "target": "end" }));

    let flow = json!({
        "id": "generated",
        "name": "Generated flow",
        "nodes": nodes,
        "edges": edges,
    });

    fs::write(&cli.output, serde_json::to_string_pretty(&flow)?)?;
    println!(
        "Successfully generated and saved a flow to '{}'",
        cli.output
    );
    Ok(())
}

fn text_element(rng: &mut ThreadRng, pool: &[&str]) -> Value {
    json!({
        "type": "text",
        "content": pool[rng.random_range(0..pool.len())],
    })
}

/// A node gets a leading text element and then one randomly chosen
/// interaction (or nothing, leaving it passive).
fn random_elements(rng: &mut ThreadRng, node_id: &str, total: usize, index: usize) -> Vec<Value> {
    let mut elements = vec![text_element(rng, STATEMENTS)];

    match rng.random_range(0..4u8) {
        0 => {
            // An option prompt; one option may jump straight to the end.
            let jump = index + 1 < total && rng.random_bool(0.5);
            let mut options = vec![json!({ "text": "Yes" }), json!({ "text": "No" })];
            if jump {
                options.push(json!({ "text": "Skip ahead", "targetNodeId": "end" }));
            }
            elements.push(json!({
                "type": "options",
                "content": PROMPTS[rng.random_range(0..PROMPTS.len())],
                "options": options,
            }));
        }
        1 => {
            elements.push(json!({
                "type": "input",
                "content": "What is your email address?",
                "inputType": "email",
                "placeholder": "you@example.com",
            }));
        }
        2 => {
            elements.push(json!({
                "type": "form",
                "content": "Tell us about yourself",
                "formFields": [
                    { "name": format!("{}-name", node_id), "label": "Name", "type": "text", "required": true },
                    { "name": format!("{}-company", node_id), "label": "Company", "type": "text" },
                ],
            }));
        }
        _ => {}
    }

    elements
}
