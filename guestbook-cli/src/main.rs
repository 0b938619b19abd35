use clap::Parser;
use guestbook_client::{GuestbookClient, GuestbookClientGrpc, GuestbookClientHttp};

#[derive(Parser, Debug)]
#[clap(name = "guestbook", about = "Command line client for the guestbook API")]
struct Cli {
    /// Talk to the gRPC endpoint instead of HTTP
    #[clap(short, long)]
    grpc: bool,

    #[clap(short, long)]
    server: Option<String>,

    /// Bearer token sent with every request
    #[clap(long, env = "GUESTBOOK_TOKEN")]
    token: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Parser, Debug)]
enum Command {
    /// List posts, one page at a time unless --all is given
    List {
        #[clap(long)]
        limit: Option<u32>,
        #[clap(long)]
        next_token: Option<String>,
        #[clap(long)]
        all: bool,
    },
    ListIds {
        #[clap(long)]
        limit: Option<u32>,
        #[clap(long)]
        next_token: Option<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[clap(long)]
        name: String,
        #[clap(long)]
        body: String,
    },
    /// Change the name and/or body; omitted fields stay as they are
    Update {
        id: String,
        #[clap(long)]
        name: Option<String>,
        #[clap(long)]
        body: Option<String>,
    },
    Remove {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Cli::parse();

    let mut client: Box<dyn GuestbookClient> = if args.grpc {
        let endpoint = args.server.as_deref().unwrap_or("http://127.0.0.1:50051");
        Box::new(
            GuestbookClientGrpc::connect(endpoint)
                .await?
                .with_token(args.token),
        )
    } else {
        let endpoint = args.server.as_deref().unwrap_or("http://127.0.0.1:8080");
        Box::new(GuestbookClientHttp::connect(endpoint)?.with_token(args.token))
    };

    match args.command {
        Command::List {
            limit,
            next_token,
            all,
        } => {
            if all {
                let posts = client.list_all_posts(limit).await?;
                println!("Posts ({})", posts.len());
                for post in posts {
                    println!("- [{}] {}", post.id, post.name);
                }
            } else {
                let page = client.list_posts(next_token, limit).await?;
                println!("Posts ({})", page.posts.len());
                for post in page.posts {
                    println!("- [{}] {}", post.id, post.name);
                }
                if let Some(token) = page.next_token {
                    println!("next_token: {}", token);
                }
            }
        }
        Command::ListIds { limit, next_token } => {
            let page = client.list_post_ids(next_token, limit).await?;
            for post in page.posts {
                println!("{}", post.id);
            }
            if let Some(token) = page.next_token {
                println!("next_token: {}", token);
            }
        }
        Command::Get { id } => {
            let post = client.get_post(&id).await?;
            println!("{}", post);
        }
        Command::Create { name, body } => {
            let post = client.create_post(name, body).await?;
            println!("Post created! ID: {}", post.id);
        }
        Command::Update { id, name, body } => {
            let post = client.update_post(&id, name, body).await?;
            println!("Post updated: {}", post)
        }
        Command::Remove { id } => {
            client.remove_post(&id).await?;
            println!("Post removed!")
        }
    }

    Ok(())
}
