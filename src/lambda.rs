use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::Client as S3Client;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use synth_data::app::service::{GenerationRequest, GenerationResponse, GenerationService, HealthReport, JobRecord};
use synth_data::config::lambda::{LambdaConfig, S3Storage};
use synth_data::utils::logger;
use synth_data::utils::validation::Validate;

#[derive(Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Request {
    Generate(GenerationRequest),
    Status { job_id: String, user_id: String },
    Health,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum Response {
    Generated {
        #[serde(flatten)]
        response: GenerationResponse,
        #[serde(skip_serializing_if = "Option::is_none")]
        download_url: Option<String>,
    },
    Status(JobRecord),
    Health(HealthReport),
}

struct Handler {
    service: GenerationService<S3Storage>,
    presign_expiry: Duration,
}

impl Handler {
    async fn handle(&self, event: LambdaEvent<Request>) -> Result<Response, Error> {
        match event.payload {
            Request::Generate(request) => {
                tracing::info!("Generate request from user {}", request.user_id);
                let response = self.service.generate(request).await?;

                let download_url = match self
                    .service
                    .storage()
                    .presigned_url(&response.location, self.presign_expiry)
                    .await
                {
                    Ok(url) => Some(url),
                    Err(e) => {
                        tracing::warn!("Could not presign {}: {}", response.location, e);
                        None
                    }
                };
                Ok(Response::Generated {
                    response,
                    download_url,
                })
            }
            Request::Status { job_id, user_id } => {
                tracing::info!("Status request for job {}", job_id);
                Ok(Response::Status(self.service.job_status(&job_id, &user_id).await?))
            }
            Request::Health => Ok(Response::Health(self.service.health())),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    let lambda_config = LambdaConfig::from_env()?;
    lambda_config.validate()?;

    let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
        .region(Region::new(lambda_config.s3_region.clone()))
        .build();
    let storage = S3Storage::new(S3Client::from_conf(s3_config), lambda_config.s3_bucket.clone())
        .with_prefix(lambda_config.s3_prefix.clone());

    let handler = Handler {
        service: GenerationService::new(storage),
        presign_expiry: Duration::from_secs(lambda_config.presign_expiry_secs),
    };
    let handler = &handler;

    tracing::info!("Synthetic data Lambda ready (bucket {})", lambda_config.s3_bucket);
    run(service_fn(move |event: LambdaEvent<Request>| async move {
        handler.handle(event).await
    }))
    .await
}
