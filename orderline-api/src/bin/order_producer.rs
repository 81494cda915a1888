//! Order Producer - generates sample orders
//!
//! Usage: order-producer [-n COUNT] [--kafka]
//!
//! Without `--kafka` the orders are written to stdout as JSON lines, ready to
//! pipe into the server's stdin source. With `--kafka` (built with the
//! `kafka` feature) they are published to `ORDERLINE_KAFKA_TOPIC` and only
//! the order ids are printed.

use orderline_api::constants::DEFAULT_PRODUCER_COUNT;
use orderline_api::producer::generate_order;
use std::io::Write;

struct Args {
    count: usize,
    kafka: bool,
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        count: DEFAULT_PRODUCER_COUNT,
        kafka: false,
    };

    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-n" => {
                let value = iter.next().ok_or("-n requires a value")?;
                args.count = value
                    .parse()
                    .map_err(|_| format!("Invalid order count: {}", value))?;
            }
            "--kafka" => args.kafka = true,
            "-h" | "--help" => {
                return Err("Usage: order-producer [-n COUNT] [--kafka]".to_string());
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(args)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{}", message);
            std::process::exit(2);
        }
    };

    let result = if args.kafka {
        publish_kafka(args.count).await
    } else {
        write_stdout(args.count)
    };

    if let Err(message) = result {
        eprintln!("{}", message);
        std::process::exit(1);
    }
}

fn write_stdout(count: usize) -> Result<(), String> {
    let mut rng = rand::rng();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    for _ in 0..count {
        let order = generate_order(&mut rng);
        let line = serde_json::to_string(&order).map_err(|e| e.to_string())?;
        writeln!(out, "{}", line).map_err(|e| e.to_string())?;
    }

    out.flush().map_err(|e| e.to_string())
}

#[cfg(feature = "kafka")]
async fn publish_kafka(count: usize) -> Result<(), String> {
    use orderline_api::KafkaConfig;
    use rdkafka::config::ClientConfig;
    use rdkafka::producer::{FutureProducer, FutureRecord};
    use std::time::Duration;

    let config = KafkaConfig::from_env();
    let producer: FutureProducer = ClientConfig::new()
        .set("bootstrap.servers", config.broker_list().join(","))
        .set("acks", "all")
        .create()
        .map_err(|e| format!("Failed to create producer: {}", e))?;

    for _ in 0..count {
        let order = generate_order(&mut rand::rng());
        let payload = serde_json::to_vec(&order).map_err(|e| e.to_string())?;
        let record = FutureRecord::to(&config.topic)
            .key(order.order_uid.as_str())
            .payload(&payload);

        match producer.send(record, Duration::from_secs(5)).await {
            Ok(_) => println!("{}", order.order_uid),
            Err((e, _)) => eprintln!("write message: {}", e),
        }
    }

    Ok(())
}

#[cfg(not(feature = "kafka"))]
async fn publish_kafka(_count: usize) -> Result<(), String> {
    Err("--kafka requires a build with the `kafka` feature".to_string())
}
