use axum::response::Html;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Welcome page HTML", content_type = "text/html")
    ),
    tag = "General"
)]
pub async fn root() -> Html<&'static str> {
    Html(r#"
        <!DOCTYPE html>
        <html lang="en">
        <head>
            <meta charset="UTF-8">
            <meta name="viewport" content="width=device-width, initial-scale=1.0">
            <title>Mixtape Drop</title>
            <style>
                body {
                    display: flex;
                    flex-direction: column;
                    justify-content: center;
                    align-items: center;
                    height: 100vh;
                    margin: 0;
                    font-family: Arial, sans-serif;
                    background-color: #151515;
                }
                h1 {
                    color: #f5f5f5;
                }
                p {
                    color: #a0a0a0;
                }
                a {
                    margin-top: 20px;
                    padding: 10px 20px;
                    background-color: #e4572e;
                    color: white;
                    text-decoration: none;
                    border-radius: 5px;
                    font-weight: bold;
                }
            </style>
        </head>
        <body>
            <h1>Mixtape Drop</h1>
            <p>Send your tracks to DJ mixtapes. DJs pick what makes the cut.</p>
            <a href="/swagger-ui/">Explore API Docs</a>
        </body>
        </html>
    "#)
}
