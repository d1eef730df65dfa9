use clap::Parser;
use kaiwa::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// A conversation flow runtime CLI: chat with a flow from a local file or
/// a live backend, with optional local session persistence.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a flow JSON file (exclusive with --base-url)
    #[arg(short, long)]
    flow: Option<String>,

    /// Base URL of a backend to fetch the flow from and report events to
    #[arg(short, long)]
    base_url: Option<String>,

    /// Public id of the assistant (required with --base-url, also used
    /// as the session store key)
    #[arg(short, long)]
    assistant: Option<String>,

    /// Directory for the local session store (flow cache + transcript
    /// resume); omit to run without persistence
    #[arg(short, long)]
    store_dir: Option<String>,

    /// Clear any saved transcript before starting
    #[arg(long)]
    reset: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let gateway: Arc<dyn Gateway> = match &cli.base_url {
        Some(base_url) => Arc::new(HttpGateway::new(base_url.clone())),
        None => Arc::new(NullGateway),
    };
    let store: Option<Arc<dyn SessionStore>> = cli
        .store_dir
        .as_ref()
        .map(|dir| Arc::new(FileStore::new(dir)) as Arc<dyn SessionStore>);

    let flow = load_flow(&cli, gateway.as_ref(), store.as_deref()).await;
    println!(
        "Flow '{}' loaded: {} nodes, {} edges",
        flow.name,
        flow.nodes.len(),
        flow.edges.len()
    );

    let store_key = cli
        .assistant
        .clone()
        .unwrap_or_else(|| flow.id.clone());

    if cli.reset {
        if let Some(store) = &store {
            if let Err(e) = store.clear(&store_key) {
                eprintln!("Warning: could not clear saved session: {}", e);
            }
        }
    }

    let mut builder = Runtime::builder(flow)
        .shared_gateway(gateway)
        .store_key(store_key)
        .user_info(UserInfo {
            source: Some("cli".to_string()),
            ..UserInfo::default()
        });
    if let Some(store) = store {
        builder = builder.shared_store(store);
    }
    let runtime = builder.build();

    if let Err(e) = runtime.start().await {
        exit_with_error(&format!("Failed to start the conversation: {}", e));
    }

    run_chat_loop(&runtime).await;
    println!("\nConversation ended.");
}

async fn load_flow(
    cli: &Cli,
    gateway: &dyn Gateway,
    store: Option<&dyn SessionStore>,
) -> FlowDocument {
    match (&cli.flow, &cli.base_url) {
        (Some(path), None) => {
            let json = fs::read_to_string(path)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)));
            UiFlow::from_json(&json)
                .and_then(IntoFlow::into_flow)
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to load flow: {}", e)))
        }
        (None, Some(_)) => {
            let assistant = cli.assistant.as_deref().unwrap_or_else(|| {
                exit_with_error("--assistant is required when fetching from --base-url")
            });
            load_flow_document(gateway, store, assistant)
                .await
                .unwrap_or_else(|e| exit_with_error(&format!("Failed to fetch flow: {}", e)))
        }
        _ => exit_with_error("Provide exactly one of --flow or --base-url"),
    }
}

async fn run_chat_loop(runtime: &Runtime) {
    let mut printed = 0;
    loop {
        print_new_messages(runtime, &mut printed);

        if runtime.is_awaiting_interaction() {
            let Some(prompt) = runtime.transcript().last().cloned() else {
                return;
            };
            if !handle_prompt(runtime, &prompt).await {
                return;
            }
            continue;
        }

        let has_next = runtime
            .current_node_id()
            .is_some_and(|current| runtime.flow().default_next(&current).is_some());
        if has_next {
            runtime.advance().await;
        } else {
            print_new_messages(runtime, &mut printed);
            return;
        }
    }
}

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
async fn handle_prompt(runtime: &Runtime, prompt: &Message) -> bool {
    let Some(element) = prompt.element.clone() else {
        return false;
    };

    match &element.kind {
        ElementKind::Options { options } => {
            let Some(answer) = prompt_for_input("Choose an option (number or text)") else {
                return false;
            };
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
                let Some(value) = prompt_for_input(&format!("{}{}", field.label, required))
                else {
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
            let Some(value) = prompt_for_input(placeholder.as_deref().unwrap_or("Your answer"))
            else {
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

/// Prompts and reads one line of input; None on end of input.
fn prompt_for_input(prompt_text: &str) -> Option<String> {
    let mut line = String::new();
    print!("> {}: ", prompt_text);
    io::stdout().flush().ok()?;
    match io::stdin().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim().to_string()),
    }
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
