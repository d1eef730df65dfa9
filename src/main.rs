use kaiwa::prelude::*;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("Usage: cargo run -- <path/to/flow.json>");
        std::process::exit(1);
    }
    let flow_path = &args[1];

    println!("Loading flow from: {}", flow_path);
    let flow_json = match fs::read_to_string(flow_path) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Failed to read flow file '{}': {}", flow_path, e);
            std::process::exit(1);
        }
    };

    let flow = match UiFlow::from_json(&flow_json).and_then(IntoFlow::into_flow) {
        Ok(flow) => flow,
        Err(e) => {
            eprintln!("Failed to load flow: {}", e);
            std::process::exit(1);
        }
    };

    println!("Flow '{}' loaded: {} nodes, {} edges", flow.name, flow.nodes.len(), flow.edges.len());
    println!("Type your answers when prompted. Ctrl-D ends the session.\n");

    let runtime = Runtime::builder(flow).build();
    if let Err(e) = runtime.start().await {
        eprintln!("Failed to start the conversation: {}", e);
        std::process::exit(1);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut printed = 0;

    loop {
        print_new_messages(&runtime, &mut printed);

        if runtime.is_awaiting_interaction() {
            let Some(prompt) = runtime.transcript().last().cloned() else {
                break;
            };
            if !handle_prompt(&runtime, &prompt, &mut lines).await {
                break;
            }
            continue;
        }

        // A passive tail: follow the default edge if one exists,
        // otherwise the conversation is over.
        let has_next = runtime
            .current_node_id()
            .is_some_and(|current| runtime.flow().default_next(&current).is_some());
        if has_next {
            runtime.advance().await;
        } else {
            break;
        }
    }

    print_new_messages(&runtime, &mut printed);
    println!("\nConversation ended.");
}

/// Prints transcript entries revealed since the last call.
fn print_new_messages(runtime: &Runtime, printed: &mut usize) {
    let rendered = runtime.render();
    for message in &rendered[*printed..] {
        let block = TranscriptFormatter::format_message(message);
        if !block.is_empty() {
            println!("{}", block);
        }
    }
    *printed = rendered.len();
}

/// Drives one interactive element. Returns false on end of input.
async fn handle_prompt(
    runtime: &Runtime,
    prompt: &Message,
    lines: &mut Lines<BufReader<Stdin>>,
) -> bool {
    let Some(element) = prompt.element.clone() else {
        return false;
    };

    match &element.kind {
        ElementKind::Options { options } => {
            let Some(answer) = read_line("Choose an option (number or text)", lines).await else {
                return false;
            };
            // Accept either the 1-based index or the option text.
            let text = answer
                .parse::<usize>()
                .ok()
                .and_then(|index| index.checked_sub(1))
                .and_then(|index| options.get(index))
                .map(|option| option.text.clone())
                .unwrap_or(answer);
            runtime.select_option(&prompt.id, &text).await;
        }
        ElementKind::Form { fields, .. } => loop {
            let mut values = HashMap::new();
            for field in fields {
                let required = if field.required { " (required)" } else { "" };
                let label = format!("{}{}", field.label, required);
                let Some(value) = read_line(&label, lines).await else {
                    return false;
                };
                values.insert(field.name.clone(), value);
            }
            match runtime.submit_form(&prompt.id, &values).await {
                Ok(()) => break,
                Err(e) => println!("{}", e),
            }
        },
        ElementKind::Input { placeholder, .. } => loop {
            let label = placeholder.as_deref().unwrap_or("Your answer");
            let Some(value) = read_line(label, lines).await else {
                return false;
            };
            match runtime.submit_input(&prompt.id, &value).await {
                Ok(()) => break,
                Err(e) => println!("{}", e),
            }
        },
        _ => return false,
    }
    true
}

async fn read_line(prompt: &str, lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    print!("> {}: ", prompt);
    let _ = std::io::stdout().flush();
    match lines.next_line().await {
        Ok(Some(line)) => Some(line.trim().to_string()),
        _ => None,
    }
}
